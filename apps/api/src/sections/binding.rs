//! Template binding — turns an immutable section model plus an order into
//! the sequence of blocks that preview and the export adapters render.
//!
//! The sequence is restartable: `RenderSequence::blocks` borrows the same
//! snapshot every time it is called, so preview, the PDF adapter, and the
//! DOCX adapter can each traverse it independently without mutation.

use crate::sections::model::{CustomSection, Item, ItemData, Sections, BUILT_IN_KEYS};

/// Render payload of one section block.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockContent<'a> {
    /// Entry-style sections: experience, education, projects, certifications.
    Items(&'a [Item]),
    /// Skills render as one flattened line.
    SkillLine(String),
    /// A user-defined section: free text plus its items.
    Custom(&'a CustomSection),
}

/// One renderable section: key, display title, and content.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderBlock<'a> {
    pub key: &'a str,
    pub title: String,
    pub content: BlockContent<'a>,
}

/// An ordered view over a section model snapshot.
pub struct RenderSequence<'a> {
    sections: &'a Sections,
    order: Vec<String>,
}

impl<'a> RenderSequence<'a> {
    /// Binds a model to its effective section order.
    ///
    /// The explicit order wins when non-empty; otherwise the template's
    /// declared fallback, otherwise the default fixed order. Keys that do
    /// not resolve to a section are dropped; sections present in the model
    /// but missing from the chosen order are appended (built-ins in default
    /// order, then custom sections), so content never silently disappears.
    pub fn bind(
        sections: &'a Sections,
        explicit_order: &[String],
        template_fallback: &[String],
    ) -> Self {
        let base: Vec<&str> = if !explicit_order.is_empty() {
            explicit_order.iter().map(String::as_str).collect()
        } else if !template_fallback.is_empty() {
            template_fallback.iter().map(String::as_str).collect()
        } else {
            BUILT_IN_KEYS.to_vec()
        };

        let mut order: Vec<String> = Vec::new();
        for key in base {
            if sections.has_section(key) && !order.iter().any(|k| k == key) {
                order.push(key.to_string());
            }
        }
        for key in BUILT_IN_KEYS {
            if !order.iter().any(|k| k == key) {
                order.push(key.to_string());
            }
        }
        for key in sections.custom_sections().keys() {
            if !order.iter().any(|k| k == key) {
                order.push(key.clone());
            }
        }

        RenderSequence { sections, order }
    }

    /// The effective order, including sections that will be filtered out as
    /// empty at render time.
    pub fn effective_order(&self) -> &[String] {
        &self.order
    }

    /// The filtered, ordered blocks. Each call restarts the traversal over
    /// the same snapshot.
    pub fn blocks(&self) -> impl Iterator<Item = RenderBlock<'_>> + '_ {
        self.order
            .iter()
            .filter_map(move |key| self.block_for(key))
    }

    fn block_for<'s>(&'s self, key: &'s str) -> Option<RenderBlock<'s>> {
        let title = self.sections.registry().display_name(key);
        let content = match key {
            "skills" => {
                let line = flatten_skills(self.sections.items("skills")?);
                if line.is_empty() {
                    return None;
                }
                BlockContent::SkillLine(line)
            }
            "experience" | "education" | "projects" | "certifications" => {
                let items = self.sections.items(key)?;
                if items.is_empty() {
                    return None;
                }
                BlockContent::Items(items)
            }
            _ => {
                let custom = self.sections.custom(key)?;
                if custom.items.is_empty() && custom.content.trim().is_empty() {
                    return None;
                }
                BlockContent::Custom(custom)
            }
        };
        Some(RenderBlock {
            key,
            title,
            content,
        })
    }
}

/// Flattens skill items into a single display line: `Rust (Expert), SQL`.
fn flatten_skills(items: &[Item]) -> String {
    let parts: Vec<String> = items
        .iter()
        .filter_map(|item| match &item.data {
            ItemData::Skill(skill) if !skill.name.trim().is_empty() => Some(match &skill.level {
                Some(level) => format!("{} ({level})", skill.name),
                None => skill.name.clone(),
            }),
            _ => None,
        })
        .collect();
    parts.join(", ")
}
