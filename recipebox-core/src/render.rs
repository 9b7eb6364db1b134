//! Read-only recipe rendering.
//!
//! Persisted recipes and form previews both go through [`RecipeView`], so the
//! two always render the same text. Rich text fields are converted to plain
//! text here; stored markup is never interpreted.

use scraper::{Html, Node};
use std::fmt::Write;

use crate::types::{Image, Ingredient, Recipe, Step};

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "tr",
];

/// Elements whose text content is never shown.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Convert an HTML fragment to plain text.
///
/// Tags are dropped, entities decoded, whitespace collapsed, and block
/// elements become line breaks. List items are prefixed with `- `.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_lines(html);
    }

    let fragment = Html::parse_fragment(html);
    let mut out = String::new();

    for node in fragment.root_element().descendants() {
        // Anything under a hidden element, at any depth, is skipped
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });
        if hidden {
            continue;
        }

        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if HIDDEN_ELEMENTS.contains(&element.name()) => {}
            Node::Element(element) => {
                let name = element.name();
                if BLOCK_ELEMENTS.contains(&name) {
                    out.push('\n');
                }
                if name == "li" {
                    out.push_str("- ");
                }
            }
            _ => {}
        }
    }

    collapse_lines(&out)
}

fn collapse_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Quantity as shown to the user: `1.0` renders as `1`, `0.5` as `0.5`.
pub fn format_quantity(quantity: f64) -> String {
    format!("{}", quantity)
}

/// `"{name} {quantity} {unit}"` with the unit lowercased.
pub fn ingredient_line(ingredient: &Ingredient) -> String {
    format!(
        "{} {} {}",
        ingredient.name,
        format_quantity(ingredient.quantity),
        ingredient.unit.to_lowercase()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepView {
    pub title: String,
    pub text: String,
}

impl From<&Step> for StepView {
    fn from(step: &Step) -> Self {
        Self {
            title: html_to_text(&step.title),
            text: html_to_text(&step.text),
        }
    }
}

/// Everything the detail view shows, already converted to display text.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeView {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<StepView>,
    pub images: Vec<Image>,
}

impl From<&Recipe> for RecipeView {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            name: html_to_text(&recipe.name),
            description: html_to_text(&recipe.description),
            tags: recipe.tags.iter().map(|t| t.name.clone()).collect(),
            ingredients: recipe.ingredients.iter().map(ingredient_line).collect(),
            steps: recipe.steps.iter().map(StepView::from).collect(),
            images: recipe.images.clone(),
        }
    }
}

/// Render a recipe as plain text with all steps listed.
pub fn render_recipe(view: &RecipeView) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", view.name);
    if !view.tags.is_empty() {
        let _ = writeln!(out, "Tags: {}", view.tags.join(", "));
    }
    if !view.description.is_empty() {
        let _ = writeln!(out, "\n{}", view.description);
    }
    if !view.images.is_empty() {
        let carousel = ImageCarousel::new(view.images.clone());
        let _ = writeln!(out, "\nImages: {}", carousel.len());
        for image in carousel.images() {
            let marker = if image.is_primary { " (primary)" } else { "" };
            let label = image.description.as_deref().unwrap_or("Recipe image");
            let _ = writeln!(out, "  [{}] {}{}", image.id, label, marker);
        }
    }

    let _ = writeln!(out, "\nIngredients");
    for line in &view.ingredients {
        let _ = writeln!(out, "  {}", line);
    }

    let _ = writeln!(out, "\nSteps");
    let viewer = StepsViewer::new(view.steps.clone());
    for line in viewer.render().lines() {
        let _ = writeln!(out, "  {}", line);
    }
    out
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepsMode {
    /// All steps at once
    #[default]
    List,
    /// One step at a time
    Navigator,
}

/// Step-by-step reader over a recipe's instructions.
#[derive(Debug, Clone)]
pub struct StepsViewer {
    steps: Vec<StepView>,
    mode: StepsMode,
    current: usize,
}

impl StepsViewer {
    pub fn new(steps: Vec<StepView>) -> Self {
        Self {
            steps,
            mode: StepsMode::default(),
            current: 0,
        }
    }

    pub fn mode(&self) -> StepsMode {
        self.mode
    }

    pub fn toggle_mode(&mut self) -> StepsMode {
        self.mode = match self.mode {
            StepsMode::List => StepsMode::Navigator,
            StepsMode::Navigator => StepsMode::List,
        };
        self.mode
    }

    pub fn current(&self) -> Option<&StepView> {
        self.steps.get(self.current)
    }

    pub fn next(&mut self) {
        self.current = (self.current + 1).min(self.steps.len().saturating_sub(1));
    }

    pub fn previous(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    /// `"Step i of n"`, one-based.
    pub fn position_label(&self) -> String {
        format!("Step {} of {}", self.current + 1, self.steps.len())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self.mode {
            StepsMode::List => {
                for (i, step) in self.steps.iter().enumerate() {
                    let _ = writeln!(out, "{}. {}", i + 1, step.title);
                    if !step.text.is_empty() {
                        let _ = writeln!(out, "   {}", step.text.replace('\n', "\n   "));
                    }
                }
            }
            StepsMode::Navigator => {
                if let Some(step) = self.current() {
                    let _ = writeln!(out, "{}", self.position_label());
                    let _ = writeln!(out, "{}", step.title);
                    let _ = writeln!(out, "{}", step.text);
                }
            }
        }
        out
    }
}

/// Cycles through a recipe's images, primary first.
#[derive(Debug, Clone)]
pub struct ImageCarousel {
    images: Vec<Image>,
    index: usize,
}

impl ImageCarousel {
    pub fn new(mut images: Vec<Image>) -> Self {
        // Stable, so non-primary images keep their order
        images.sort_by_key(|i| !i.is_primary);
        Self { images, index: 0 }
    }

    pub fn images(&self) -> &[Image] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn current(&self) -> Option<&Image> {
        self.images.get(self.index)
    }

    pub fn next(&mut self) -> Option<&Image> {
        if !self.images.is_empty() {
            self.index = (self.index + 1) % self.images.len();
        }
        self.current()
    }

    pub fn previous(&mut self) -> Option<&Image> {
        if !self.images.is_empty() {
            self.index = self
                .index
                .checked_sub(1)
                .unwrap_or(self.images.len() - 1);
        }
        self.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, primary: bool) -> Image {
        Image {
            id: id.to_string(),
            filename: format!("{}.jpg", id),
            content_type: "image/jpeg".to_string(),
            description: None,
            is_primary: primary,
            upload_date: None,
        }
    }

    #[test]
    fn test_html_to_text() {
        assert_eq!(html_to_text("<p>Tomato <b>soup</b></p>"), "Tomato soup");
        assert_eq!(
            html_to_text("<p>Mix</p><ul><li>flour</li><li>salt &amp; pepper</li></ul>"),
            "Mix\n- flour\n- salt & pepper"
        );
        assert_eq!(html_to_text("plain   text"), "plain text");
        assert_eq!(html_to_text("<script>alert(1)</script>Done"), "Done");
    }

    #[test]
    fn test_html_to_text_skips_nested_hidden_content() {
        assert_eq!(
            html_to_text("<p>Visible</p><template><p>secret</p><ul><li>x</li></ul></template>"),
            "Visible"
        );
        assert_eq!(
            html_to_text("<div>Stir<style>p { color: red }</style></div>"),
            "Stir"
        );
    }

    #[test]
    fn test_ingredient_line() {
        assert_eq!(
            ingredient_line(&Ingredient::new("Water", "CUPS", 1.0)),
            "Water 1 cups"
        );
        assert_eq!(
            ingredient_line(&Ingredient::new("Butter", "TABLESPOONS", 0.5)),
            "Butter 0.5 tablespoons"
        );
    }

    #[test]
    fn test_steps_navigator_clamps() {
        let mut viewer = StepsViewer::new(vec![
            StepView::from(&Step::new("One", "a")),
            StepView::from(&Step::new("Two", "b")),
        ]);
        assert_eq!(viewer.mode(), StepsMode::List);
        assert_eq!(viewer.toggle_mode(), StepsMode::Navigator);

        viewer.previous();
        assert_eq!(viewer.position_label(), "Step 1 of 2");
        viewer.next();
        viewer.next();
        assert_eq!(viewer.position_label(), "Step 2 of 2");
        assert!(viewer.is_last());
        assert!(viewer.render().starts_with("Step 2 of 2\nTwo\n"));
    }

    #[test]
    fn test_carousel_primary_first_and_wraps() {
        let mut carousel = ImageCarousel::new(vec![
            image("a", false),
            image("b", true),
            image("c", false),
        ]);
        assert_eq!(carousel.current().map(|i| i.id.as_str()), Some("b"));
        assert_eq!(carousel.previous().map(|i| i.id.as_str()), Some("c"));
        assert_eq!(carousel.next().map(|i| i.id.as_str()), Some("b"));
        assert_eq!(carousel.next().map(|i| i.id.as_str()), Some("a"));

        let mut empty = ImageCarousel::new(Vec::new());
        assert!(empty.next().is_none());
    }

    #[test]
    fn test_render_recipe_sections() {
        let recipe = Recipe {
            name: "<h1>Tea</h1>".to_string(),
            description: "<p>Hot &amp; simple</p>".to_string(),
            ingredients: vec![Ingredient::new("Water", "CUPS", 1.0)],
            steps: vec![Step::new("Boil", "<p>Boil the water</p>")],
            ..Default::default()
        };

        let text = render_recipe(&RecipeView::from(&recipe));
        assert!(text.starts_with("Tea\n"));
        assert!(text.contains("Hot & simple"));
        assert!(text.contains("  Water 1 cups\n"));
        assert!(text.contains("  1. Boil\n     Boil the water\n"));
    }
}
