use anyhow::Context;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::services::slug::{is_valid_slug, slugify};
use crate::services::{CategoryService, NewCategory, NewPosition, OrgService};

#[derive(Subcommand)]
pub enum FixtureCommands {
    #[command(about = "Load categories and an org chart from a YAML file")]
    Load {
        #[arg(help = "Fixture file path")]
        file: PathBuf,
    },
}

/// Seed data file layout
///
/// ```yaml
/// categories:
///   - name: Politics
///     description: Parliament and government
/// org:
///   - title: Prime Minister
///     occupant_name: Jane Doe
///     children:
///       - title: Minister of Finance
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    #[serde(default)]
    pub categories: Vec<FixtureCategory>,
    #[serde(default)]
    pub org: Vec<FixturePosition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixturePosition {
    pub title: String,
    pub occupant_name: Option<String>,
    pub is_vacant: Option<bool>,
    #[serde(default)]
    pub children: Vec<FixturePosition>,
}

impl Fixture {
    pub fn parse(source: &str) -> anyhow::Result<Self> {
        let fixture: Fixture = serde_yaml::from_str(source)?;
        for category in &fixture.categories {
            let slug = category.slug.clone().unwrap_or_else(|| slugify(&category.name));
            if !is_valid_slug(&slug) {
                anyhow::bail!("category '{}' has invalid slug '{}'", category.name, slug);
            }
        }
        Ok(fixture)
    }

    /// Total positions across every level.
    pub fn position_count(&self) -> usize {
        fn count(positions: &[FixturePosition]) -> usize {
            positions.iter().map(|p| 1 + count(&p.children)).sum()
        }
        count(&self.org)
    }
}

pub async fn handle(cmd: FixtureCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        FixtureCommands::Load { file } => handle_load(file, output_format).await,
    }
}

async fn handle_load(file: PathBuf, output_format: OutputFormat) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;
    let fixture = Fixture::parse(&source).with_context(|| format!("parsing {}", file.display()))?;

    let pool = connect().await?;

    let categories = CategoryService::new(pool.clone());
    for category in &fixture.categories {
        let slug = category.slug.clone().unwrap_or_else(|| slugify(&category.name));
        categories
            .upsert(NewCategory {
                name: category.name.clone(),
                slug,
                description: category.description.clone(),
            })
            .await?;
    }

    // Parents are inserted before their children; siblings keep file order.
    let org = OrgService::new(pool);
    let mut pending: Vec<(Option<i64>, i32, &FixturePosition)> = fixture
        .org
        .iter()
        .enumerate()
        .rev()
        .map(|(i, p)| (None, i as i32, p))
        .collect();
    while let Some((parent_id, sort_order, position)) = pending.pop() {
        let created = org
            .create(NewPosition {
                title: position.title.clone(),
                occupant_name: position.occupant_name.clone(),
                parent_id,
                is_vacant: position.is_vacant.unwrap_or(position.occupant_name.is_none()),
                sort_order,
            })
            .await?;
        for (i, child) in position.children.iter().enumerate().rev() {
            pending.push((Some(created.id), i as i32, child));
        }
    }

    tracing::info!("Loaded fixture {}", file.display());
    output_success(
        output_format,
        &format!(
            "Loaded {} categories and {} org positions from {}",
            fixture.categories.len(),
            fixture.position_count(),
            file.display()
        ),
        Some(json!({
            "categories": fixture.categories.len(),
            "positions": fixture.position_count()
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_org_chart() {
        let fixture = Fixture::parse(
            r#"
categories:
  - name: World News
  - name: Local
    slug: local
org:
  - title: Prime Minister
    occupant_name: Jane Doe
    children:
      - title: Minister of Finance
        children:
          - title: Deputy Minister
      - title: Minister of Health
"#,
        )
        .unwrap();

        assert_eq!(fixture.categories.len(), 2);
        assert_eq!(fixture.org.len(), 1);
        assert_eq!(fixture.position_count(), 4);
        assert_eq!(fixture.org[0].children[0].children[0].title, "Deputy Minister");
    }

    #[test]
    fn rejects_bad_slug_and_unknown_fields() {
        assert!(Fixture::parse("categories:\n  - name: X\n    slug: Not A Slug\n").is_err());
        assert!(Fixture::parse("articles: []\n").is_err());
    }

    #[test]
    fn bundled_sample_parses() {
        let fixture = Fixture::parse(include_str!("../../../fixtures/sample.yaml")).unwrap();
        assert_eq!(fixture.categories.len(), 4);
        assert_eq!(fixture.position_count(), 5);
    }

    #[test]
    fn empty_file_is_empty_fixture() {
        let fixture = Fixture::parse("{}").unwrap();
        assert_eq!(fixture.position_count(), 0);
    }
}
