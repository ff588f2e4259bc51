use chrono::{Duration, Utc};
use log::info;

use crate::db::Database;
use crate::error::StoreError;
use crate::models::{
    AppEntry, AppRequest, Category, Comment, CommentTarget, HelpRequest, PriceVote, RequestStatus,
};
use crate::pricing::VoteStore;

struct DemoApp {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: Category,
    tags: &'static [&'static str],
    author: &'static str,
    likes: i64,
    age_minutes: i64,
    votes: &'static [f64],
}

const DEMO_APPS: &[DemoApp] = &[
    DemoApp {
        id: "1",
        name: "NeonTasker",
        description: "A futuristic productivity tool that organises your life with AI insights and a cyberpunk look.",
        category: Category::Productivity,
        tags: &["React", "Tailwind", "AI"],
        author: "AlexCode",
        likes: 124,
        age_minutes: 0,
        votes: &[10.0, 12.0, 12.0, 15.0, 9.0, 8.0, 25.0, 5.0, 12.0, 11.0],
    },
    DemoApp {
        id: "2",
        name: "BeatSync VR",
        description: "Virtual reality music visualiser that runs straight in the browser. Sync your local files.",
        category: Category::Entertainment,
        tags: &["WebXR", "Three.js", "AudioAPI"],
        author: "VibeMaster",
        likes: 89,
        age_minutes: 2,
        votes: &[5.0, 5.0, 0.0, 10.0, 2.0],
    },
    DemoApp {
        id: "3",
        name: "FinFlow",
        description: "Personal finance tracker with simple linear regression forecasts for savings goals.",
        category: Category::Finance,
        tags: &["Python", "Flask", "Chart.js"],
        author: "MoneyWizard",
        likes: 210,
        age_minutes: 4,
        votes: &[20.0, 25.0, 22.0, 18.0, 20.0, 100.0, 0.0, 21.0],
    },
];

// Fill an empty catalogue with demo content, returns the number of apps inserted
pub async fn load_demo(db: &Database) -> Result<usize, StoreError> {
    if db.count_apps().await? > 0 {
        info!("Catalogue already populated, skipping demo data");
        return Ok(0);
    }

    let now = Utc::now();
    for demo in DEMO_APPS {
        let app = AppEntry {
            id: demo.id.to_string(),
            name: demo.name.to_string(),
            description: demo.description.to_string(),
            category: demo.category,
            tags: demo.tags.iter().map(|t| t.to_string()).collect(),
            thumbnail_url: format!("https://picsum.photos/seed/{}/500/500", demo.name.to_lowercase().replace(' ', "")),
            demo_url: "#".to_string(),
            author: demo.author.to_string(),
            likes: demo.likes,
            created_at: now - Duration::minutes(demo.age_minutes),
        };
        db.insert_app(&app).await?;

        for &price in demo.votes {
            db.append_vote(&PriceVote::new(&app.id, price, None)).await?;
        }
    }

    let thread = CommentTarget::App("1".to_string());
    let mut welcome = Comment::new(thread.clone(), None, "SarahDev".to_string(), "The UI looks great! How did you do the glow effect?".to_string());
    welcome.timestamp = now - Duration::days(1);
    db.create_comment(&welcome).await?;

    let mut reply = Comment::new(thread, Some(&welcome.id), "AlexCode".to_string(), "Thanks! It's Tailwind's box-shadow.".to_string());
    reply.timestamp = welcome.timestamp + Duration::hours(1);
    db.create_comment(&reply).await?;

    let requests = [
        ("r1", "Meal planner AI", "Snap a photo of the fridge and get a week of meals plus a shopping list for what's missing.", "HealthLife", 45, RequestStatus::Pending, 8),
        ("r2", "Dream journal", "Record dreams by voice, transcribe them and get an AI reading of what they mean.", "Dreamer", 82, RequestStatus::InProgress, 20),
    ];
    for (id, title, description, author, votes, status, age_minutes) in requests {
        db.insert_app_request(&AppRequest {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            author: author.to_string(),
            votes,
            status,
            created_at: now - Duration::minutes(age_minutes),
        })
        .await?;
    }

    db.insert_help_request(&HelpRequest {
        id: "h1".to_string(),
        app_name: "WeatherVibe".to_string(),
        description: "The weather API data doesn't render right away. Is it the useEffect dependency array?".to_string(),
        category: Category::Utilities,
        tags: vec!["React".to_string(), "API".to_string(), "Async".to_string()],
        thumbnail_url: "https://picsum.photos/seed/weatherbug/500/500".to_string(),
        author: "JuniorDev".to_string(),
        source_url: Some("https://github.com/example/weather-vibe".to_string()),
        code_snippet: Some("useEffect(() => {\n  fetchData();\n}, []);".to_string()),
        created_at: now - Duration::minutes(5),
    })
    .await?;

    db.insert_help_request(&HelpRequest {
        id: "h2".to_string(),
        app_name: "RetroGame".to_string(),
        description: "In my canvas brick breaker the ball sometimes passes straight through bricks.".to_string(),
        category: Category::Entertainment,
        tags: vec!["HTML5 Canvas".to_string(), "JS".to_string(), "GameDev".to_string()],
        thumbnail_url: "https://picsum.photos/seed/retrogame/500/500".to_string(),
        author: "GameMaker".to_string(),
        source_url: None,
        code_snippet: None,
        created_at: now - Duration::minutes(10),
    })
    .await?;

    info!("Loaded {} demo apps", DEMO_APPS.len());
    Ok(DEMO_APPS.len())
}
