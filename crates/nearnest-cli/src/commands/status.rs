use std::sync::Arc;

use nearnest_client::session::Screen;
use nearnest_store::{LocalStore, flags};

use super::{App, next_step};
use crate::config::Settings;

/// Print configuration and session state. Never fails for a missing config.
pub async fn run(settings: Settings, store: Arc<LocalStore>) -> anyhow::Result<()> {
    if let Err(e) = &settings.backend {
        println!("NearNest is not configured: {}", e);
        return Ok(());
    }

    let app = App::connect(settings, store).await?;
    println!("Backend:  configured");
    println!("Handles:  {:?}", app.settings.handle_policy);

    match app.session.user() {
        Some(user) => {
            let kind = if user.is_anonymous { "anonymous" } else { "email" };
            println!("User:     {} ({})", user.id, kind);
            if let Some(email) = &user.email {
                println!("Email:    {}", email);
            }
        }
        None if flags::signed_out(&app.store) => println!("User:     signed out"),
        None => println!("User:     not signed in"),
    }

    if let Some(profile) = app.session.profile() {
        println!("Handle:   {}", profile.handle);
        if app.session.screen() == Screen::Ready {
            println!("Location: {:.3}, {:.3}", profile.lat_rounded, profile.lon_rounded);
        }
    }

    println!("\n{}", next_step(app.session.screen()));
    Ok(())
}
