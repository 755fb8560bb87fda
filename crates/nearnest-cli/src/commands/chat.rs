use anyhow::bail;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;
use uuid::Uuid;

use nearnest_client::composer::Composer;
use nearnest_client::display::{TimeStyle, relative_time};
use nearnest_client::dm::Conversation;
use nearnest_client::feed::MessageFeed;
use nearnest_client::nearby::NearbyUsers;
use nearnest_client::session::Screen;
use nearnest_client::throttle::SendOutcome;
use nearnest_client::validate::validate_body;
use nearnest_store::BlockList;
use nearnest_types::events::AuthEvent;

use super::{App, next_step};

enum Input {
    Line(Option<String>),
    Changed,
    Auth(Option<AuthEvent>),
}

/// Interactive public feed. Lines are sent as messages; `/help` lists commands.
pub async fn feed(app: &mut App) -> anyhow::Result<()> {
    let profile = app.ready_profile()?;
    let blocks = BlockList::load(app.store.clone());
    let mut feed = MessageFeed::new(app.backend(), profile, blocks);
    let mut composer = Composer::new();
    let mut auth_events = app.supabase.auth().subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    feed.open().await;
    print_feed(&feed);
    if !feed.is_live() {
        println!("(live updates unavailable, use /refresh)");
    }

    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            _ = feed.changed() => Input::Changed,
            event = auth_events.recv() => Input::Auth(match event {
                Ok(event) => Some(event),
                Err(RecvError::Lagged(_)) => None,
                Err(RecvError::Closed) => None,
            }),
        };

        let line = match input {
            Input::Changed => {
                feed.refresh().await;
                print_feed(&feed);
                continue;
            }
            Input::Auth(Some(event)) => {
                if app.session.apply(event).await != Screen::Ready {
                    println!("{}", next_step(app.session.screen()));
                    break;
                }
                continue;
            }
            Input::Auth(None) => continue,
            Input::Line(None) => break,
            Input::Line(Some(line)) => line,
        };

        let trimmed = line.trim();
        if let Some(command) = trimmed.strip_prefix('/') {
            if !feed_command(&mut feed, command).await {
                break;
            }
            continue;
        }

        // An empty line resends a draft kept after a rejected send.
        if !trimmed.is_empty() {
            composer.set_draft(&line);
        }
        send(&mut composer, &mut feed).await;
    }

    feed.close();
    Ok(())
}

async fn send(composer: &mut Composer, feed: &mut MessageFeed) {
    let Some(text) = composer.begin() else {
        if let Err(e) = validate_body(composer.draft()) {
            println!("! {}", e);
        }
        return;
    };

    let outcome = feed.send(&text).await;
    match &outcome {
        SendOutcome::Sent => {
            if !feed.is_live() {
                feed.refresh().await;
                print_feed(feed);
            }
        }
        SendOutcome::Throttled { retry_in } => debug!("throttled for {:?}", retry_in),
        SendOutcome::Invalid(e) => println!("! {}", e),
        SendOutcome::Failed(e) => println!("! {}", e.user_message()),
    }

    composer.finish(text, outcome.is_sent());
    if let Some(notice) = composer.notice() {
        println!("! {} (press Enter to resend)", notice);
    }
}

/// Returns false when the loop should end.
async fn feed_command(feed: &mut MessageFeed, command: &str) -> bool {
    let mut parts = command.splitn(3, ' ');
    let name = parts.next().unwrap_or_default();
    let index = parts.next().and_then(|n| n.parse::<usize>().ok());
    let rest = parts.next().map(str::to_string);

    match name {
        "quit" | "q" => return false,
        "refresh" => {
            feed.refresh().await;
            print_feed(feed);
        }
        "report" | "block" => {
            let Some(target) = index
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| feed.visible().get(i).map(|m| (**m).clone()))
            else {
                println!("! Usage: /{} <number>", name);
                return true;
            };
            if feed.is_own(&target) {
                println!("! That is your own message");
                return true;
            }
            if name == "report" {
                feed.report(target.id, rest).await;
                println!("Reported. Thanks for keeping NearNest friendly.");
            } else {
                feed.block(&target.handle);
                println!("Blocked {}", target.handle);
                print_feed(feed);
            }
        }
        _ => {
            println!("Commands: /refresh, /report <n> [reason], /block <n>, /quit");
        }
    }
    true
}

fn print_feed(feed: &MessageFeed) {
    let now = Utc::now();
    let visible = feed.visible();
    println!();
    if visible.is_empty() {
        println!("No messages nearby in the last 24 hours.");
        return;
    }
    for (i, m) in visible.iter().enumerate() {
        let who = if feed.is_own(m) { "you" } else { m.handle.as_str() };
        println!(
            "{:>3}. [{}] {}: {}",
            i + 1,
            relative_time(m.created_at, now, TimeStyle::Feed),
            who,
            m.body
        );
    }
}

/// Interactive one-to-one conversation with `user_id`.
pub async fn direct(app: &mut App, user_id: Uuid) -> anyhow::Result<()> {
    let me = app.ready_profile()?;

    let mut nearby = NearbyUsers::new(app.backend(), me.clone());
    nearby.load().await;
    let Some(other) = nearby.users().iter().find(|u| u.id == user_id).cloned() else {
        bail!("No user with id {}. Run 'nearnest users' to list them", user_id);
    };

    let mut chat = Conversation::new(app.backend(), me, other);
    let mut composer = Composer::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    chat.open().await;
    print_conversation(&chat);

    loop {
        let input = tokio::select! {
            line = lines.next_line() => Input::Line(line?),
            _ = chat.changed() => Input::Changed,
        };

        let line = match input {
            Input::Changed => {
                chat.refresh().await;
                print_conversation(&chat);
                continue;
            }
            Input::Line(Some(line)) => line,
            Input::Line(None) | Input::Auth(_) => break,
        };

        match line.trim() {
            "/quit" | "/q" => break,
            "/refresh" => {
                chat.refresh().await;
                print_conversation(&chat);
                continue;
            }
            "" => {}
            _ => composer.set_draft(&line),
        }

        let Some(text) = composer.begin() else {
            if let Err(e) = validate_body(composer.draft()) {
                println!("! {}", e);
            }
            continue;
        };
        let outcome = chat.send(&text).await;
        if let SendOutcome::Failed(e) = &outcome {
            println!("! {}", e.user_message());
        }
        composer.finish(text, outcome.is_sent());
        if let Some(notice) = composer.notice() {
            println!("! {} (press Enter to resend)", notice);
        }
    }

    chat.close();
    Ok(())
}

fn print_conversation(chat: &Conversation) {
    let now = Utc::now();
    println!();
    if chat.messages().is_empty() {
        println!("No messages with {} yet.", chat.other().handle);
        return;
    }
    for m in chat.messages() {
        let who = if chat.is_mine(m) { "you" } else { chat.other().handle.as_str() };
        println!(
            "[{}] {}: {}",
            relative_time(m.created_at, now, TimeStyle::Compact),
            who,
            m.body
        );
    }
}
