//! Admin account commands

use crate::config::Config;
use crate::db::{NewUser, Store};
use crate::domain::password::{UserAttributes, check_password};

pub async fn cmd_create_admin(
    config: &Config,
    email: &str,
    password: &str,
    name: &str,
    student_id: &str,
) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    let policy = check_password(
        password,
        config.security.min_password_length,
        &UserAttributes {
            email: &email,
            full_name: name,
            student_id,
        },
    );
    if !policy.is_empty() {
        for problem in policy {
            println!("  - {problem}");
        }
        anyhow::bail!("Password does not meet the policy");
    }

    let store = Store::new(&config.general.database_path).await?;

    if store.get_user_by_email(&email).await?.is_some() {
        store.set_user_admin(&email, true).await?;
        store
            .update_user_password(&email, password, &config.security)
            .await?;
        println!("Existing account {email} promoted to admin and password updated.");
        return Ok(());
    }

    let user = store
        .create_user(
            NewUser {
                email: email.clone(),
                full_name: name.to_string(),
                student_id: student_id.to_string(),
                password: password.to_string(),
                is_admin: true,
                profile_image_base64: None,
            },
            &config.security,
        )
        .await?;

    println!("Admin account created: {} ({})", user.email, user.id);
    Ok(())
}

pub async fn cmd_promote(config: &Config, email: &str) -> anyhow::Result<()> {
    let store = Store::new(&config.general.database_path).await?;
    let email = email.trim().to_lowercase();

    if store.set_user_admin(&email, true).await? {
        println!("{email} is now an admin.");
        Ok(())
    } else {
        anyhow::bail!("No account found for {email}")
    }
}
