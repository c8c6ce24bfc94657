//! `SeaORM` implementation of the `ElectionService` trait.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::db::{
    Candidate, CandidateInput, Election, ElectionInput, ElectionRemoval, Store, Vote,
};
use crate::services::election_service::{
    AdminDashboard, CandidateForm, CandidateResult, ElectionError, ElectionResults,
    ElectionService, ElectionSummary, StudentSummary, VoteAuditEntry,
};
use crate::services::media::{MediaKind, MediaService};

const RECENT_ELECTIONS: u64 = 5;

pub struct SeaOrmElectionService {
    store: Store,
    media: Arc<MediaService>,
}

impl SeaOrmElectionService {
    #[must_use]
    pub const fn new(store: Store, media: Arc<MediaService>) -> Self {
        Self { store, media }
    }

    async fn summarize(&self, elections: Vec<Election>) -> Result<Vec<ElectionSummary>, ElectionError> {
        let now = Utc::now();
        let mut out = Vec::with_capacity(elections.len());
        for election in elections {
            let count = self.store.count_votes(&election.id).await?;
            out.push(ElectionSummary::new(election, count, now));
        }
        Ok(out)
    }
}

fn validate_election(input: &ElectionInput) -> Result<(), ElectionError> {
    if input.title.trim().is_empty() || input.description.trim().is_empty() {
        return Err(ElectionError::Validation(
            "All fields are required.".to_string(),
        ));
    }
    if input.end_date <= input.start_date {
        return Err(ElectionError::Validation(
            "End date must be after start date.".to_string(),
        ));
    }
    Ok(())
}

/// Percentage of `total` rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
fn percentage(votes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    ((votes as f64 / total as f64) * 10_000.0).round() / 100.0
}

/// Tallies ballots per candidate, highest first. Ties keep candidate order.
fn tally(candidates: Vec<Candidate>, votes: &[Vote]) -> Vec<CandidateResult> {
    let total = votes.len() as u64;
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for vote in votes {
        *counts.entry(vote.candidate_id.as_str()).or_default() += 1;
    }

    let mut results: Vec<CandidateResult> = candidates
        .into_iter()
        .map(|candidate| {
            let votes = counts.get(candidate.id.as_str()).copied().unwrap_or(0);
            CandidateResult {
                percentage: percentage(votes, total),
                candidate,
                votes,
            }
        })
        .collect();

    results.sort_by(|a, b| b.votes.cmp(&a.votes));
    results
}

fn matches_query(student: &StudentSummary, query: &str) -> bool {
    student.full_name.to_lowercase().contains(query)
        || student.email.to_lowercase().contains(query)
        || student.student_id.to_lowercase().contains(query)
}

#[async_trait]
impl ElectionService for SeaOrmElectionService {
    async fn dashboard(&self) -> Result<AdminDashboard, ElectionError> {
        let now = Utc::now();
        let all = self.store.list_elections().await?;
        let active_elections = all
            .iter()
            .filter(|e| crate::domain::is_ongoing(e.is_active, e.start_date, e.end_date, now))
            .count() as u64;

        let recent = self.store.recent_elections(RECENT_ELECTIONS).await?;
        let recent_elections = self.summarize(recent).await?;

        Ok(AdminDashboard {
            total_elections: all.len() as u64,
            active_elections,
            total_students: self.store.count_students().await?,
            total_votes: self.store.count_all_votes().await?,
            chart_labels: recent_elections.iter().map(|e| e.title.clone()).collect(),
            chart_data: recent_elections.iter().map(|e| e.vote_count).collect(),
            recent_elections,
        })
    }

    async fn list_elections(&self) -> Result<Vec<ElectionSummary>, ElectionError> {
        let elections = self.store.list_elections().await?;
        self.summarize(elections).await
    }

    async fn get_election(&self, raw_id: &str) -> Result<Election, ElectionError> {
        self.store
            .find_election(raw_id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(raw_id.to_string()))
    }

    async fn create_election(
        &self,
        input: ElectionInput,
        created_by: &str,
    ) -> Result<Election, ElectionError> {
        validate_election(&input)?;
        let input = ElectionInput {
            is_active: true,
            ..input
        };
        Ok(self.store.create_election(input, created_by).await?)
    }

    async fn update_election(
        &self,
        raw_id: &str,
        input: ElectionInput,
    ) -> Result<Election, ElectionError> {
        validate_election(&input)?;
        let election = self.get_election(raw_id).await?;
        self.store
            .update_election(&election.id, input)
            .await?
            .ok_or_else(|| ElectionError::NotFound(raw_id.to_string()))
    }

    async fn delete_election(&self, raw_id: &str) -> Result<ElectionRemoval, ElectionError> {
        let election = self.get_election(raw_id).await?;
        let removal = self
            .store
            .delete_election_cascade(&election.id)
            .await?
            .ok_or_else(|| ElectionError::NotFound(raw_id.to_string()))?;

        self.media.remove_all(&removal.media).await;
        Ok(removal)
    }

    async fn list_candidates(
        &self,
        raw_election_id: &str,
    ) -> Result<(Election, Vec<Candidate>), ElectionError> {
        let election = self.get_election(raw_election_id).await?;
        let candidates = self.store.list_candidates(&election.id).await?;
        Ok((election, candidates))
    }

    async fn add_candidate(
        &self,
        raw_election_id: &str,
        form: CandidateForm,
    ) -> Result<Candidate, ElectionError> {
        let election = self.get_election(raw_election_id).await?;

        if [&form.name, &form.description, &form.position, &form.image]
            .iter()
            .any(|field| field.trim().is_empty())
        {
            return Err(ElectionError::Validation(
                "Name, Position, Description, and Photo are required.".to_string(),
            ));
        }

        let stem = format!("{}_{}", election.id, crate::domain::DocumentId::generate());
        let image = self
            .media
            .store(MediaKind::CandidateImage, &stem, &form.image)
            .await?;

        let candidate = self
            .store
            .add_candidate(
                &election.id,
                CandidateInput {
                    name: form.name.trim().to_string(),
                    description: form.description.trim().to_string(),
                    position: form.position.trim().to_string(),
                    image: Some(image),
                },
            )
            .await?;
        Ok(candidate)
    }

    async fn delete_candidate(&self, raw_id: &str) -> Result<Candidate, ElectionError> {
        let candidate = self
            .store
            .delete_candidate(raw_id)
            .await?
            .ok_or_else(|| ElectionError::CandidateNotFound(raw_id.to_string()))?;

        if let Some(image) = &candidate.image {
            self.media.remove(image).await;
        }
        Ok(candidate)
    }

    async fn results(&self, raw_election_id: &str) -> Result<ElectionResults, ElectionError> {
        let election = self.get_election(raw_election_id).await?;
        let candidates = self.store.list_candidates(&election.id).await?;
        let votes = self.store.list_votes(&election.id).await?;
        let total_votes = votes.len() as u64;

        let names: HashMap<String, String> = candidates
            .iter()
            .map(|c| (c.id.clone(), c.name.clone()))
            .collect();

        let mut emails: Vec<String> = votes.iter().map(|v| v.voter_email.clone()).collect();
        emails.sort();
        emails.dedup();
        let voters: HashMap<String, _> = self
            .store
            .get_users_by_emails(&emails)
            .await?
            .into_iter()
            .map(|u| (u.email.to_lowercase(), u))
            .collect();

        let audit = votes
            .iter()
            .map(|vote| {
                let profile = voters.get(&vote.voter_email.to_lowercase());
                VoteAuditEntry {
                    vote_id: vote.id.clone(),
                    voter_email: vote.voter_email.clone(),
                    voter_name: profile
                        .map_or_else(|| "Unknown Voter".to_string(), |u| u.full_name.clone()),
                    student_id: profile.map_or_else(|| "N/A".to_string(), |u| u.student_id.clone()),
                    profile_image_base64: profile.and_then(|u| u.profile_image_base64.clone()),
                    candidate_id: vote.candidate_id.clone(),
                    candidate_name: names
                        .get(&vote.candidate_id)
                        .cloned()
                        .unwrap_or_else(|| "Unknown".to_string()),
                    voter_image: vote.voter_image.clone(),
                    latitude: vote.latitude,
                    longitude: vote.longitude,
                    city: vote.city.clone(),
                    country: vote.country.clone(),
                    ip_address: vote.ip_address.clone(),
                    voted_at: vote.voted_at,
                }
            })
            .collect();

        let results = tally(candidates, &votes);

        Ok(ElectionResults {
            election: ElectionSummary::new(election, total_votes, Utc::now()),
            total_votes,
            chart_labels: results.iter().map(|r| r.candidate.name.clone()).collect(),
            chart_data: results.iter().map(|r| r.votes).collect(),
            results,
            votes: audit,
        })
    }

    async fn list_students(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<StudentSummary>, ElectionError> {
        let students = self
            .store
            .list_students()
            .await?
            .into_iter()
            .map(StudentSummary::from);

        match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let q = q.to_lowercase();
                Ok(students.filter(|s| matches_query(s, &q)).collect())
            }
            None => Ok(students.collect()),
        }
    }

    async fn delete_student(&self, user_id: &str) -> Result<u64, ElectionError> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| ElectionError::StudentNotFound(user_id.to_string()))?;

        if user.is_admin {
            return Err(ElectionError::AdminProtected);
        }

        let removal = self
            .store
            .delete_user_with_votes(&user.id)
            .await?
            .ok_or_else(|| ElectionError::StudentNotFound(user_id.to_string()))?;

        self.media.remove_all(&removal.media).await;

        info!(email = %user.email, removed_votes = removal.votes, "Student removed by admin");
        Ok(removal.votes)
    }
}
