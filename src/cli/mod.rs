pub mod commands;

use std::io::{self, Write};

use crate::ai::processor::TurnProcessor;
use crate::ai::visual::VisualPayload;
use crate::api::middleware::RequestContext;
use crate::cli::commands::{Commands, SessionAction};
use crate::config::AppConfig;
use crate::db::{get_connection, service::DbService};
use crate::llm::ProviderFactory;

pub async fn run_cli(command: Commands, config_path: String) {
    let config = AppConfig::load(&config_path).expect("Failed to load config");

    match command {
        Commands::Serve => {
            panic!("Serve command should be intercepted by main.rs to boot actix-web");
        }
        Commands::Session { action } => {
            let pool = get_connection(&config.database).expect("DB error");
            let conn = pool.lock().unwrap();

            match action {
                SessionAction::List { tenant } => {
                    match DbService::list_sessions(&conn, &tenant, 50) {
                        Ok(sessions) => {
                            if sessions.is_empty() {
                                println!("No sessions found for tenant {}.", tenant);
                            } else {
                                println!("{:<38} | {:<12} | {:<20} | {}", "ID", "User", "Updated At", "Session");
                                println!("{:-<38}-+-{:-<12}-+-{:-<20}-+-{:-<20}", "", "", "", "");
                                for s in sessions {
                                    println!(
                                        "{:<38} | {:<12} | {:<20} | {}",
                                        s.id.to_string(),
                                        s.user_id,
                                        s.updated_at,
                                        s.session_id
                                    );
                                }
                            }
                        }
                        Err(e) => eprintln!("Error: {}", e),
                    }
                }
                SessionAction::Show { tenant, user, session } => {
                    let found = match DbService::find_session(&conn, &tenant, &user, &session) {
                        Ok(Some(s)) => s,
                        _ => {
                            eprintln!("Session \"{}\" not found.", session);
                            return;
                        }
                    };
                    let messages = DbService::get_messages(&conn, found.id, 1000).unwrap_or_default();

                    println!("Session: {} / {} / {}", tenant, user, session);
                    println!("Created At: {}", found.created_at);
                    println!("---");
                    for m in messages {
                        println!("[{}]: {}", m.role.to_uppercase(), m.text);
                        println!("---");
                    }
                }
            }
        }
        Commands::Chat { tenant, user, session } => {
            run_repl(tenant, user, session, config).await;
        }
    }
}

async fn run_repl(tenant: String, user: String, session: String, config: AppConfig) {
    let pool = get_connection(&config.database).expect("DB Error");
    let llm = ProviderFactory::create_default(&config).expect("Failed to init LLM provider");
    let processor = TurnProcessor::from_config(&config, pool, llm);

    let ctx = RequestContext {
        tenant_id: tenant.clone(),
        user_id: user,
        role: "admin".to_string(),
    };

    println!("--- Max Terminal Chat ---");
    println!("Tenant: {}  Session: {}", tenant, session);
    println!("Type /exit to quit.");
    println!("-------------------------");

    loop {
        print!("\nUser> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        io::stdin().read_line(&mut input).unwrap();
        let text = input.trim();

        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        match processor.run_turn(&ctx, &session, text).await {
            Ok(outcome) => {
                println!("Max> {}", outcome.reply_text);
                match outcome.visual {
                    Some(VisualPayload::Image { url, .. }) => println!("  [image: {}]", truncate(&url, 60)),
                    Some(VisualPayload::Video { url, .. }) => println!("  [video: {}]", url),
                    Some(VisualPayload::Youtube { id, .. }) => {
                        println!("  [youtube: https://youtu.be/{}]", id)
                    }
                    None => {}
                }
            }
            Err(e) => eprintln!("Turn failed: {}", e),
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}…", s.chars().take(max).collect::<String>())
    } else {
        s.to_string()
    }
}
