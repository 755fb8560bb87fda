use nearnest_types::events::AuthEvent;

use super::{App, next_step};

pub async fn login(app: &App, email: &str) -> anyhow::Result<()> {
    let redirect = app.settings.redirect_url.as_deref();
    app.supabase
        .auth()
        .sign_in_with_otp(email, redirect)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("Check {} for a sign-in code.", email.trim());
    println!("Then run 'nearnest verify --email {} --code <code>'", email.trim());
    Ok(())
}

pub async fn verify(app: &mut App, email: &str, code: &str) -> anyhow::Result<()> {
    let user = app
        .supabase
        .auth()
        .verify_otp(email, code)
        .await
        .map_err(|e| anyhow::anyhow!("Code verification failed: {}", e.user_message()))?;

    let screen = app.session.apply(AuthEvent::SignedIn(user)).await;
    println!("✓ Signed in");
    println!("{}", next_step(screen));
    Ok(())
}

pub async fn anonymous(app: &mut App) -> anyhow::Result<()> {
    let user = app
        .supabase
        .auth()
        .sign_in_anonymously()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let screen = app.session.apply(AuthEvent::SignedIn(user)).await;
    println!("✓ Signed in anonymously");
    println!("{}", next_step(screen));
    Ok(())
}

pub async fn sign_out(app: &mut App) -> anyhow::Result<()> {
    app.session.sign_out().await?;
    println!("✓ Signed out");
    Ok(())
}
