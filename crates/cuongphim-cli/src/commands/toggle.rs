use super::context;
use crate::output::Output;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use saved_media_config::{Config, PathManager};
use saved_media_models::SavedItem;
use serde_json::json;

pub fn build_item(
    id: Option<u64>,
    slug: String,
    name: String,
    year: Option<u32>,
    quality: Option<String>,
    thumb_url: Option<String>,
    poster_url: Option<String>,
) -> SavedItem {
    SavedItem {
        id,
        slug,
        name,
        year,
        quality,
        thumb_url,
        poster_url,
        ..SavedItem::default()
    }
}

pub async fn run_toggle(paths: PathManager, config: Config, item: SavedItem, output: &Output) -> Result<()> {
    let (client, _) = context::open(&paths, &config, output).await?;
    let name = item.name.clone();
    let key = item.key();

    let outcome = match client.toggle(item).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // The collection is untouched on failure
            output.error(format!("Could not update \"{}\": {}", name, e));
            return Err(eyre!("Toggle failed"));
        }
    };

    if !output.is_human() {
        output.json(&json!({
            "type": "toggle",
            "key": key.to_string(),
            "added": outcome.added,
            "applied": outcome.applied,
        }));
        return Ok(());
    }

    if !outcome.applied {
        output.warn(format!("A newer change to \"{}\" took precedence", name));
    } else if outcome.added {
        output.success(format!("Saved \"{}\"", name));
    } else {
        output.success(format!("Removed \"{}\"", name));
    }
    Ok(())
}
