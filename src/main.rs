use log::{error, info};
use price_vote::config::Config;
use price_vote::db::Database;
use price_vote::gallery::Gallery;
use price_vote::models::Category;
use price_vote::{comments, seed};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: price-vote list [category] | show <app-id> | vote <app-id> <price> \
                     | like <app-id> <session> | requests | help";

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging (RUST_LOG may come from .env)
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::load();

    let database = match Database::new(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if config.seed_demo_data {
        if let Err(e) = seed::load_demo(&database).await {
            error!("Failed to load demo data: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let gallery = Gallery::new(database);
    let args: Vec<String> = env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match run(&gallery, &args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(gallery: &Gallery, args: &[&str]) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    match args {
        [] | ["list"] | ["list", _] => {
            let category = match args.get(1) {
                Some(label) => Some(label.parse::<Category>()?),
                None => None,
            };
            for card in gallery.grid(category).await? {
                println!(
                    "{:<38} {:<24} {:>12}/mo  ({} votes)",
                    card.app.id, card.app.name, card.price.display, card.price.vote_count
                );
            }
        }
        ["show", app_id] => {
            let detail = gallery.detail(app_id).await?;
            println!("{} by {} [{}]", detail.app.name, detail.app.author, detail.app.category);
            println!("{}", detail.app.description);
            println!("Tags: {}", detail.app.tags.join(", "));
            println!(
                "Valuation: {}/mo from {} votes",
                detail.price.display, detail.price.vote_count
            );
            println!("Comments: {}", comments::count(&detail.comments));
            print_threads(&detail.comments, 1);
        }
        ["vote", app_id, price] => {
            let price: f64 = price
                .parse()
                .map_err(|e| format!("Invalid price {:?}: {}", price, e))?;

            match gallery.submit_vote(app_id, price, None).await {
                Ok(votes) => {
                    info!("Vote accepted for {}", app_id);
                    let tag = votes.price_tag();
                    println!("New valuation: {}/mo from {} votes", tag.display, tag.vote_count);
                }
                Err(e) => {
                    println!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
        ["like", app_id, session] => {
            let toggle = gallery.toggle_like(app_id, session).await?;
            let verb = if toggle.active { "Liked" } else { "Unliked" };
            println!("{} {} ({} likes)", verb, app_id, toggle.total);
        }
        ["requests"] => {
            for request in gallery.requests().await? {
                println!("{:>5}  {:<12} {}", request.votes, request.status, request.title);
            }
        }
        ["help"] => {
            for thread in gallery.help_requests().await? {
                println!(
                    "{} by {} [{}] ({} comments)",
                    thread.request.app_name,
                    thread.request.author,
                    thread.request.category,
                    comments::count(&thread.comments)
                );
                println!("  {}", thread.request.description);
            }
        }
        _ => return Err(USAGE.into()),
    }

    Ok(())
}

fn print_threads(threads: &[price_vote::models::Comment], depth: usize) {
    for comment in threads {
        println!("{}{}: {}", "  ".repeat(depth), comment.author, comment.text);
        print_threads(&comment.replies, depth + 1);
    }
}
