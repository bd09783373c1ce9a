use howtocook::{ApiError, ClientConfig, HowToCook, RecipeSelector, SelectionCategory};
use mockito::{Matcher, Server};
use scraper::{Html, Selector};
use tempfile::TempDir;

fn client(url: String, dir: &TempDir) -> HowToCook {
    HowToCook::builder()
        .config(ClientConfig::default())
        .base_url(url)
        .storage_path(dir.path().join("last_viewed.json"))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_generated_recipe_becomes_a_card() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let mock = server
        .mock("POST", "/api/recipes/generate")
        .match_body(Matcher::PartialJsonString(
            r#"{"selections": {"vegetables": ["土豆"], "meats": ["牛肉"], "mode": ["严格匹配"]}}"#
                .to_string(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r##"{
                "success": true,
                "data": {
                    "recipe": {
                        "name": "土豆炖牛肉",
                        "description": "家常炖菜",
                        "materials": ["土豆 2 个", "牛肉 500g"],
                        "procedure": [{"text": "牛肉焯水", "level": 0}],
                        "extraInfo": ["可以加一点番茄"]
                    },
                    "rawMarkdown": "# 土豆炖牛肉"
                }
            }"##,
        )
        .create_async()
        .await;

    let mut selector = RecipeSelector::new();
    selector.toggle(SelectionCategory::Vegetables, "土豆");
    selector.toggle(SelectionCategory::Meats, "牛肉");
    selector.toggle(SelectionCategory::Mode, "模糊匹配");
    selector.toggle(SelectionCategory::Mode, "严格匹配");

    let view = client(server.url(), &dir)
        .generate(&selector)
        .await
        .unwrap();
    mock.assert_async().await;

    assert!(view.id.starts_with("generated-"));
    assert_eq!(view.difficulty_icons, 1);

    let document = Html::parse_fragment(&view.to_html());
    let items = Selector::parse("section.materials li").unwrap();
    let texts: Vec<String> = document
        .select(&items)
        .map(|li| li.text().collect::<String>().trim().to_string())
        .collect();
    assert_eq!(texts, vec!["土豆 2 个", "牛肉 500g"]);

    let extra = Selector::parse("section.extra-info p").unwrap();
    assert_eq!(document.select(&extra).count(), 1);
}

#[tokio::test]
async fn test_generation_failure_carries_server_message() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    server
        .mock("POST", "/api/recipes/generate")
        .with_status(500)
        .with_body(r#"{"success": false, "message": "AI 服务暂时不可用"}"#)
        .create_async()
        .await;

    let err = client(server.url(), &dir)
        .generate(&RecipeSelector::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Generation(_)));
    assert_eq!(err.to_string(), "AI 服务暂时不可用");
}
