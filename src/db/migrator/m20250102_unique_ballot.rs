use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        // Keep the earliest ballot per voter before the index goes on.
        conn.execute_unprepared(
            "DELETE FROM votes WHERE rowid NOT IN (SELECT MIN(rowid) FROM votes GROUP BY election_id, voter_email)",
        )
        .await?;

        conn.execute_unprepared(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_votes_election_voter ON votes(election_id, voter_email)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        conn.execute_unprepared("DROP INDEX IF EXISTS idx_votes_election_voter")
            .await?;

        Ok(())
    }
}
