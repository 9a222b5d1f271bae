//! Favorites subcommands: list, toggle.

use std::io::Write;

use plenary_core::favorites::{FavoriteKind, Favorites};

/// Favorites subcommand actions.
#[derive(clap::Subcommand, Debug)]
pub enum FavoritesAction {
    /// List favorite ids (both lists when no kind is given).
    List {
        /// `news` or `project`.
        kind: Option<FavoriteKind>,
    },
    /// Add an id to a favorites list, or remove it if already present.
    Toggle {
        /// `news` or `project`.
        kind: FavoriteKind,
        /// News item or bill ID.
        id: u64,
    },
}

/// Execute a favorites subcommand.
pub fn run(
    favorites: &Favorites,
    action: FavoritesAction,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        FavoritesAction::List { kind } => {
            let kinds = kind.map_or_else(
                || vec![FavoriteKind::News, FavoriteKind::Project],
                |k| vec![k],
            );
            for kind in kinds {
                let ids = favorites.list(kind)?;
                if ids.is_empty() {
                    writeln!(out, "{kind}: (none)")?;
                } else {
                    let joined: Vec<String> = ids.iter().map(u64::to_string).collect();
                    writeln!(out, "{kind}: {}", joined.join(", "))?;
                }
            }
        }
        FavoritesAction::Toggle { kind, id } => {
            if favorites.toggle(kind, id)? {
                writeln!(out, "Added {kind} #{id} to favorites.")?;
            } else {
                writeln!(out, "Removed {kind} #{id} from favorites.")?;
            }
        }
    }
    Ok(())
}
