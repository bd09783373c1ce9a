use log::{debug, error};
use std::env;

use howtocook::{HowToCook, PageState, RecipePage, RecipeSelector, SelectionCategory};
use tokio_util::sync::CancellationToken;

const USAGE: &str = "Usage: howtocook [--remote] <search TERM | show ID | last | categories | generate [CATEGORY=ITEM,ITEM ...]>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let remote = args.iter().any(|a| a == "--remote");
    args.retain(|a| a != "--remote");

    let mut builder = HowToCook::builder();
    if remote {
        builder = builder.remote();
    }
    let client = builder.build()?;
    debug!("Backend: {}", client.config().api_url());

    let command = args.first().ok_or(USAGE)?;
    match command.as_str() {
        "search" => {
            let term = args.get(1..).map(|rest| rest.join(" ")).unwrap_or_default();
            if term.trim().is_empty() {
                return Err(USAGE.into());
            }
            let results = client
                .api()
                .search_recipes(
                    term.trim(),
                    "",
                    1,
                    client.config().page_size,
                    &CancellationToken::new(),
                )
                .await?;
            for recipe in results.data {
                println!("{}\t{}", recipe.id, recipe.name);
            }
        }
        "show" => {
            let id = args.get(1).ok_or(USAGE)?;
            let mut page = client.page();
            if page.select_recipe(id).await.is_none() {
                error!("Recipe {} could not be loaded", id);
                return Err("加载食谱失败".into());
            }
            print_page(&page);
        }
        "last" => {
            let mut page = client.page();
            page.initialize().await;
            if let Some(banner) = page.error() {
                eprintln!("{}", banner.message);
            }
            print_page(&page);
        }
        "categories" => {
            for category in client.api().get_categories().await {
                println!("{}", category.name());
            }
        }
        "generate" => {
            let selector = parse_selections(&args[1..])?;
            let view = client.generate(&selector).await?;
            println!("{}", view.to_html());
        }
        other => {
            error!("Unknown command: {}", other);
            return Err(USAGE.into());
        }
    }

    Ok(())
}

fn print_page(page: &RecipePage) {
    match page.state() {
        PageState::Loaded(view) => println!("{}", view.to_html()),
        _ => debug!("Nothing to show"),
    }
}

/// `vegetables=土豆,番茄 mode=严格匹配`
fn parse_selections(args: &[String]) -> Result<RecipeSelector, Box<dyn std::error::Error>> {
    let mut selector = RecipeSelector::new();
    for arg in args {
        let (key, items) = arg
            .split_once('=')
            .ok_or_else(|| format!("Expected CATEGORY=ITEM,..., got {}", arg))?;
        let category = SelectionCategory::from_key(key)?;
        for item in items.split(',') {
            selector.add_custom(category, item);
        }
    }
    Ok(selector)
}
