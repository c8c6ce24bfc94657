//! `IndexNow` URL submission

use serde::Serialize;

use crate::config::Config;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Submission<'a> {
    host: &'a str,
    key: &'a str,
    key_location: &'a str,
    url_list: &'a [String],
}

pub async fn cmd_indexnow(config: &Config) -> anyhow::Result<()> {
    let indexnow = &config.indexnow;
    if indexnow.key.is_empty() || indexnow.urls.is_empty() {
        anyhow::bail!("indexnow.key and indexnow.urls must be configured");
    }

    let client = reqwest::Client::builder()
        .user_agent(concat!("votehub/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client
        .post(&indexnow.endpoint)
        .json(&Submission {
            host: &indexnow.host,
            key: &indexnow.key,
            key_location: &indexnow.key_location,
            url_list: &indexnow.urls,
        })
        .send()
        .await?;

    let status = response.status();
    println!("Status Code: {}", status.as_u16());
    if status.is_success() {
        println!("Submitted {} URL(s).", indexnow.urls.len());
        Ok(())
    } else {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("IndexNow rejected the submission ({status}): {body}")
    }
}
