use nearnest_client::nearby::NearbyUsers;
use nearnest_store::BlockList;

use super::App;

pub async fn list(app: &App) -> anyhow::Result<()> {
    let me = app.ready_profile()?;
    let mut nearby = NearbyUsers::new(app.backend(), me);
    nearby.load().await;

    if nearby.users().is_empty() {
        println!("Nobody else is around yet.");
        return Ok(());
    }

    println!("Users ({}):", nearby.users().len());
    for user in nearby.users() {
        println!("  {}  {}", user.id, user.handle);
    }
    println!("\nRun 'nearnest dm <id>' to start a conversation");
    Ok(())
}

pub fn blocked(blocks: &BlockList) {
    if blocks.is_empty() {
        println!("No blocked handles");
        return;
    }
    println!("Blocked handles ({}):", blocks.len());
    for handle in blocks.handles() {
        println!("  {}", handle);
    }
}
