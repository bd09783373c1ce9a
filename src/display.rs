//! View models for a single recipe card.

use html_escape::encode_double_quoted_attribute;

use crate::markdown::{inline_to_html, parse_inline, render_section, PLACEHOLDER_IMAGE};
use crate::model::{Recipe, Section};

/// Placeholder description the backend stores for recipes without one
const NO_DESCRIPTION: &str = "No description available";

const DIFFICULTY_LABEL: &str = "预估烹饪难度：";

/// Difficulty runs from 1 to 5; anything above shows the full row
pub const MAX_DIFFICULTY_ICONS: u32 = 5;

/// An image that falls back to the placeholder once loading fails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeImage {
    pub src: String,
    pub alt: String,
    pub fallback: String,
    failed: bool,
}

impl SafeImage {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            alt: alt.into(),
            fallback: PLACEHOLDER_IMAGE.to_string(),
            failed: false,
        }
    }

    /// The source currently shown
    pub fn current_src(&self) -> &str {
        if self.failed {
            &self.fallback
        } else {
            &self.src
        }
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    /// Loading failed; further failures keep the placeholder
    pub fn on_error(&mut self) {
        self.failed = true;
    }

    pub fn to_html(&self) -> String {
        format!(
            "<img src=\"{}\" alt=\"{}\" data-fallback=\"{}\" loading=\"lazy\" />",
            encode_double_quoted_attribute(self.current_src()),
            encode_double_quoted_attribute(&self.alt),
            encode_double_quoted_attribute(&self.fallback),
        )
    }
}

/// One rendered content section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub section: Section,
    pub html: String,
}

/// Everything needed to show one recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeView {
    pub id: String,
    pub name: String,
    pub image: Option<SafeImage>,
    /// Description as HTML, absent when there is nothing to say
    pub description_html: Option<String>,
    pub difficulty_icons: u32,
    pub sections: Vec<SectionView>,
}

impl RecipeView {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        let image = if recipe.image_url.is_empty() {
            None
        } else {
            Some(SafeImage::new(&recipe.image_url, &recipe.name))
        };

        let description = recipe.description.trim();
        let description_html = if description.is_empty() || description == NO_DESCRIPTION {
            None
        } else {
            Some(inline_to_html(&parse_inline(description)))
        };

        let image_urls = recipe.known_image_urls();
        let sections = Section::ALL
            .iter()
            .filter(|section| !recipe.section(**section).is_empty())
            .map(|section| SectionView {
                section: *section,
                html: render_section(recipe.section(*section), &recipe.source_url, &image_urls),
            })
            .collect();

        RecipeView {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            image,
            description_html,
            difficulty_icons: recipe.difficulty.min(MAX_DIFFICULTY_ICONS),
            sections,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from("<article class=\"recipe-card\">\n");

        if let Some(image) = &self.image {
            html.push_str(&format!(
                "<div class=\"recipe-image-container\">{}</div>\n",
                image.to_html()
            ));
        }

        html.push_str(&format!(
            "<h1 class=\"recipe-title\">{}</h1>\n",
            html_escape::encode_text(&self.name)
        ));

        if let Some(description) = &self.description_html {
            html.push_str(&format!(
                "<p class=\"recipe-description\">{}</p>\n",
                description
            ));
        }

        html.push_str(&format!(
            "<div class=\"recipe-difficulty\"><span class=\"difficulty-label\">{}</span>",
            DIFFICULTY_LABEL
        ));
        for _ in 0..self.difficulty_icons {
            html.push_str("<span class=\"difficulty-icon\">★</span>");
        }
        html.push_str("</div>\n");

        for section in &self.sections {
            html.push_str(&format!(
                "<section class=\"recipe-section {}\">\n<h2>{}</h2>\n{}</section>\n",
                section.section.css_class(),
                section.section.title(),
                section.html
            ));
        }

        html.push_str("</article>\n");
        html
    }
}

/// Shown while a recipe is being fetched
pub fn loading_html() -> String {
    "<div class=\"recipe-loading\"><div class=\"spinner\"></div><p>加载中...</p></div>\n"
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HierarchicalItem;
    use scraper::{Html, Selector};

    fn recipe(difficulty: u32) -> Recipe {
        Recipe {
            id: "r1".to_string(),
            name: "酸梅汤".to_string(),
            difficulty,
            description: "夏日 **解暑** 饮品".to_string(),
            materials: vec![HierarchicalItem::new("- 乌梅 30g", 0)],
            procedure: vec![HierarchicalItem::new("- 小火慢煮", 0)],
            image_url: "https://example.com/a.jpg".to_string(),
            source_url: "https://github.com/x/y/blob/master/dishes/drink/z.md".to_string(),
            ..Default::default()
        }
    }

    fn count(html: &str, selector: &str) -> usize {
        let document = Html::parse_fragment(html);
        let selector = Selector::parse(selector).unwrap();
        document.select(&selector).count()
    }

    #[test]
    fn test_difficulty_icons_match_difficulty() {
        assert_eq!(count(&RecipeView::from_recipe(&recipe(0)).to_html(), ".difficulty-icon"), 0);
        assert_eq!(count(&RecipeView::from_recipe(&recipe(3)).to_html(), ".difficulty-icon"), 3);
    }

    #[test]
    fn test_difficulty_icons_are_capped() {
        let view = RecipeView::from_recipe(&recipe(4_000_000_000));
        assert_eq!(view.difficulty_icons, MAX_DIFFICULTY_ICONS);
        assert_eq!(count(&view.to_html(), ".difficulty-icon"), 5);
    }

    #[test]
    fn test_difficulty_label_always_present() {
        let html = RecipeView::from_recipe(&recipe(0)).to_html();
        assert!(html.contains("预估烹饪难度："));
    }

    #[test]
    fn test_only_non_empty_sections_render() {
        let view = RecipeView::from_recipe(&recipe(2));
        let sections: Vec<Section> = view.sections.iter().map(|s| s.section).collect();
        assert_eq!(sections, vec![Section::Materials, Section::Procedure]);

        let html = view.to_html();
        assert_eq!(count(&html, "section.recipe-section"), 2);
        assert!(html.contains("<h2>必备原料和工具</h2>"));
        assert!(!html.contains("<h2>计算</h2>"));
    }

    #[test]
    fn test_placeholder_description_is_hidden() {
        let mut recipe = recipe(1);
        recipe.description = "No description available".to_string();
        let view = RecipeView::from_recipe(&recipe);
        assert!(view.description_html.is_none());
        assert_eq!(count(&view.to_html(), ".recipe-description"), 0);
    }

    #[test]
    fn test_description_renders_inline_markup() {
        let view = RecipeView::from_recipe(&recipe(1));
        assert_eq!(
            view.description_html.as_deref(),
            Some("夏日 <strong>解暑</strong> 饮品")
        );
    }

    #[test]
    fn test_section_images_resolve_against_source() {
        let mut recipe = recipe(1);
        recipe.extra_info = vec![HierarchicalItem::new("![成品](./photo.jpg)", 0)];
        let html = RecipeView::from_recipe(&recipe).to_html();
        assert!(html.contains(
            "https://raw.githubusercontent.com/x/y/master/dishes/drink/photo.jpg"
        ));
    }

    #[test]
    fn test_safe_image_falls_back_once() {
        let mut image = SafeImage::new("https://example.com/broken.jpg", "x");
        assert_eq!(image.current_src(), "https://example.com/broken.jpg");

        image.on_error();
        assert_eq!(image.current_src(), PLACEHOLDER_IMAGE);
        image.on_error();
        assert_eq!(image.current_src(), PLACEHOLDER_IMAGE);
        assert!(image.has_failed());
    }

    #[test]
    fn test_loading_view_has_spinner() {
        assert_eq!(count(&loading_html(), ".spinner"), 1);
    }

    #[test]
    fn test_missing_image_is_omitted() {
        let mut recipe = recipe(1);
        recipe.image_url.clear();
        let html = RecipeView::from_recipe(&recipe).to_html();
        assert_eq!(count(&html, ".recipe-image-container"), 0);
    }
}
