use std::io::{self, Write};

use anyhow::Result;

use crate::auth::{AuthClient, decode_claims};
use crate::core::AppConfig;
use crate::core::db::{ACCESS_TOKEN_KEY, USER_KEY, async_db, kv_set};

pub enum Mode {
    Login,
    Register,
}

fn prompt(label: &str) -> String {
    print!("{label}");
    io::stdout().flush().unwrap();
    let mut value = String::new();
    io::stdin()
        .read_line(&mut value)
        .expect("Failed to read input");
    value.trim().to_owned()
}

pub async fn run(mode: Mode, config: &AppConfig) -> Result<()> {
    let client = AuthClient::new(&config.api_base_url);

    let response = match mode {
        Mode::Login => {
            let email = prompt("Email: ");
            let password = prompt("Password: ");
            client.login(&email, &password).await?
        }
        Mode::Register => {
            let email = prompt("Email: ");
            let username = prompt("Username: ");
            let password = prompt("Password: ");
            client.register(&email, &username, &password).await?
        }
    };

    let db = async_db(&config.storage_path).await?;
    kv_set(&db, ACCESS_TOKEN_KEY, &response.access_token).await?;
    kv_set(&db, USER_KEY, &response.user.to_string()).await?;

    match decode_claims(&response.access_token) {
        Some(user) => println!("Signed in as {} <{}>", user.username, user.email),
        None => println!("Signed in."),
    }

    Ok(())
}
