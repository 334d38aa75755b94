use crate::racecard::{Entrant, RaceCardResult};
use std::fmt::Display;

/// Limits applied when rendering a race card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Most entrants listed before truncating; chat embeds cap field counts
    pub max_entrants: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { max_entrants: 18 }
    }
}

/// Formats a race card as a markdown chat message
///
/// # Arguments
///
/// * `card` - The race card to render
/// * `options` - Rendering limits
///
/// # Returns
///
/// A formatted markdown string
pub fn format_race_card(card: &RaceCardResult, options: &RenderOptions) -> String {
    let mut md = String::new();

    md.push_str(&format!("## 🐎 {}\n", card.race_info.title));
    md.push_str(&format!("**日程:** {}\n", card.race_info.date));
    md.push_str(&format!("**コース:** {}\n", card.race_info.course));
    md.push_str(&format!("**クラス:** {}\n\n", card.race_info.class));

    for (index, horse) in card.horses().iter().take(options.max_entrants).enumerate() {
        md.push_str(&format_entrant(index + 1, horse));
    }

    if card.total_horses() > options.max_entrants {
        md.push_str(&format!(
            "\n**注意:** 表示は{}頭まで。全{}頭のデータを取得済み。\n",
            options.max_entrants,
            card.total_horses()
        ));
    }

    md.push_str(&format!(
        "\n-# Total: {}頭 | {} | {}\n",
        card.total_horses(),
        card.scraped_at_iso(),
        card.method
    ));

    md
}

/// Formats one entrant as two message lines
fn format_entrant(position: usize, horse: &Entrant) -> String {
    format!(
        "**{}. {}**\n枠{} | 馬番{} | {} | {}kg | 騎手: {} | オッズ: {}\n",
        position,
        horse.name,
        horse.frame_number,
        horse.horse_number,
        horse.age,
        horse.weight,
        horse.jockey,
        horse.odds
    )
}

/// Formats a lookup failure with the usual suspects
pub fn format_error(race_id: &str, error: &impl Display) -> String {
    format!(
        "❌ エラーが発生しました ({}): {}\n\n\
         **考えられる原因:**\n\
         - 無効なレースID\n\
         - ネットワークエラー\n\
         - サイトのアクセス制限\n",
        race_id, error
    )
}
