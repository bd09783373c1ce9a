use howtocook::{ClientConfig, HowToCook, LastViewedStore, PageState};
use mockito::{Matcher, Server, ServerGuard};
use tempfile::TempDir;

const SUANMEITANG: &str = r#"
{
    "_id": {"$oid": "64f0c0ffee"},
    "name": "酸梅汤",
    "category": "drink",
    "difficulty": {"$numberInt": "2"},
    "description": "夏日 **解暑** 饮品",
    "materials": ["- 乌梅 30g", {"text": "- 提前泡软", "level": {"$numberInt": "1"}}],
    "calculations": [],
    "procedure": [{"text": "- 小火慢煮 40 分钟", "level": 0}],
    "extraInfo": ["![成品](./suanmeitang.jpg)"],
    "imageUrl": "https://raw.githubusercontent.com/x/y/master/dishes/drink/suanmeitang.jpg",
    "sourceUrl": "https://github.com/x/y/blob/master/dishes/drink/酸梅汤.md"
}
"#;

const HONGSHAOROU: &str = r#"
{
    "_id": "r2",
    "name": "红烧肉",
    "difficulty": 4,
    "materials": ["- 五花肉 500g"],
    "procedure": ["- 焯水", "- 炒糖色"]
}
"#;

fn client(server: &ServerGuard, dir: &TempDir) -> HowToCook {
    HowToCook::builder()
        .config(ClientConfig::default())
        .base_url(server.url())
        .storage_path(dir.path().join("last_viewed.json"))
        .build()
        .unwrap()
}

async fn mock_search(server: &mut ServerGuard, query: &str, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/api/search")
        .match_query(Matcher::UrlEncoded("query".into(), query.into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await
}

#[tokio::test]
async fn test_first_visit_searches_default_term() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let search = mock_search(
        &mut server,
        "酸梅汤",
        r#"{"data": [{"_id": "64f0c0ffee", "name": "酸梅汤"}], "total": 1, "page": 1, "totalPages": 1}"#,
    )
    .await;
    let detail = server
        .mock("GET", "/api/recipes/64f0c0ffee")
        .with_status(200)
        .with_body(SUANMEITANG)
        .create_async()
        .await;

    let client = client(&server, &dir);
    let mut page = client.page();
    page.initialize().await;

    search.assert_async().await;
    detail.assert_async().await;

    let recipe = page.recipe().unwrap();
    assert_eq!(recipe.id, "64f0c0ffee");
    assert_eq!(recipe.difficulty, 2);
    assert_eq!(recipe.materials[1].level, 1);

    let PageState::Loaded(view) = page.state() else {
        panic!("expected a loaded recipe");
    };
    let html = view.to_html();
    assert!(html.contains(
        "https://raw.githubusercontent.com/x/y/master/dishes/drink/suanmeitang.jpg"
    ));
    assert!(html.contains("<strong>解暑</strong>"));
    assert_eq!(html.matches("class=\"difficulty-icon\"").count(), 2);
}

#[tokio::test]
async fn test_selection_is_restored_on_next_visit() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    let detail = server
        .mock("GET", "/api/recipes/r2")
        .with_status(200)
        .with_body(HONGSHAOROU)
        .expect(2)
        .create_async()
        .await;

    let client = client(&server, &dir);
    let mut page = client.page();
    let text = page.select_recipe("r2").await;
    assert_eq!(text.as_deref(), Some("红烧肉"));

    let stored = LastViewedStore::new(dir.path().join("last_viewed.json"))
        .load()
        .unwrap();
    assert_eq!(stored.id, "r2");

    // a fresh page goes straight to the stored recipe without searching
    let mut revisit = client.page();
    revisit.initialize().await;
    assert_eq!(revisit.recipe().map(|r| r.name.as_str()), Some("红烧肉"));
    assert_eq!(revisit.search_term(), "红烧肉");

    detail.assert_async().await;
}

#[tokio::test]
async fn test_unknown_term_shows_not_found_banner() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    mock_search(
        &mut server,
        "佛跳墙",
        r#"{"data": [], "total": 0, "page": 1, "totalPages": 0}"#,
    )
    .await;

    let client = client(&server, &dir);
    let mut page = client.page();
    page.search_and_show("佛跳墙").await;

    assert_eq!(page.state(), &PageState::Empty);
    assert_eq!(
        page.error().map(|e| e.message.as_str()),
        Some("未找到\"佛跳墙\"的相关食谱")
    );
}

#[tokio::test]
async fn test_backend_down_is_not_fatal() {
    let mut server = Server::new_async().await;
    let dir = TempDir::new().unwrap();

    server
        .mock("GET", Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let client = client(&server, &dir);
    assert!(client.api().get_categories().await.is_empty());
    assert!(client.api().fetch_recipes(1, 20).await.is_empty());

    let mut page = client.page();
    assert!(page.select_recipe("r2").await.is_none());
    assert_eq!(page.error().map(|e| e.message.as_str()), Some("加载食谱失败"));
}
