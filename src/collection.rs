//! Ordered collection rules.
//!
//! Navigation links, poems, recordings, books and archive entries all follow
//! the same contract: every item has a stable `id`, an `enabled` flag that
//! controls public visibility, and an integer `order`. Display order is the
//! ascending `order`, with ties broken by array position (stable sort).
//!
//! `order` values are not kept contiguous. A one-step move swaps the `order`
//! of two neighbours and leaves everything else untouched; inserts append at
//! `count + 1`; removal never renumbers.
//!
//! Every operation here is a pure function from a slice to a new `Vec`, so the
//! editor and the tests share exactly the same code path.

use std::fmt;
use std::str::FromStr;
use std::sync::{LazyLock, Mutex};
use ulid::{Generator, Ulid};

/// A list element that can be shown, hidden and reordered.
pub trait Orderable: Clone {
    /// Prefix for freshly generated ids, e.g. `poem` → `poem_01j…`.
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn order(&self) -> i64;
    fn set_order(&mut self, order: i64);

    /// A new, enabled item with the type's editor defaults.
    fn new_item(id: String, order: i64) -> Self;
}

/// Direction of a one-step move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Direction::Up),
            "down" => Ok(Direction::Down),
            other => Err(format!("expected 'up' or 'down', got '{other}'")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One editor action on a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionOp {
    Move { id: String, direction: Direction },
    Toggle { id: String },
    Insert,
    Remove { id: String },
}

/// Apply a single [`CollectionOp`].
pub fn apply<T: Orderable>(items: &[T], op: &CollectionOp) -> Vec<T> {
    match op {
        CollectionOp::Move { id, direction } => move_adjacent(items, id, *direction),
        CollectionOp::Toggle { id } => toggle_enabled(items, id),
        CollectionOp::Insert => insert(items),
        CollectionOp::Remove { id } => remove(items, id),
    }
}

/// All items in display order (the editor's view).
pub fn sorted<T: Orderable>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    out.sort_by_key(|item| item.order());
    out
}

/// Enabled items in display order. The only view public pages render.
pub fn public_view<T: Orderable>(items: &[T]) -> Vec<T> {
    let mut out: Vec<T> = items.iter().filter(|i| i.enabled()).cloned().collect();
    out.sort_by_key(|item| item.order());
    out
}

/// Move one item a single step up or down the display order.
///
/// The item and its neighbour in the order-sorted sequence swap `order`
/// values; no other item changes. Unknown ids and moves past either end
/// return the input unchanged.
///
/// When both neighbours share an `order`, the swap leaves the values as they
/// were, but the returned sequence still has the two items exchanged so the
/// position-based tie break reflects the move.
pub fn move_adjacent<T: Orderable>(items: &[T], id: &str, direction: Direction) -> Vec<T> {
    let mut seq = sorted(items);
    let Some(pos) = seq.iter().position(|i| i.id() == id) else {
        return items.to_vec();
    };
    let neighbour = match direction {
        Direction::Up if pos > 0 => pos - 1,
        Direction::Down if pos + 1 < seq.len() => pos + 1,
        _ => return items.to_vec(),
    };

    let a = seq[pos].order();
    let b = seq[neighbour].order();
    seq[pos].set_order(b);
    seq[neighbour].set_order(a);
    seq.swap(pos, neighbour);
    seq
}

/// Flip `enabled` on the first item with `id`. `order` is untouched.
pub fn toggle_enabled<T: Orderable>(items: &[T], id: &str) -> Vec<T> {
    let mut out = items.to_vec();
    if let Some(item) = out.iter_mut().find(|i| i.id() == id) {
        let flipped = !item.enabled();
        item.set_enabled(flipped);
    }
    out
}

/// Append a new item with a fresh id at `order = count + 1`.
pub fn insert<T: Orderable>(items: &[T]) -> Vec<T> {
    insert_with_id(items, new_item_id(T::ID_PREFIX))
}

/// [`insert`] with a caller-chosen id.
///
/// Orders may collide with existing values after removals; ties fall back to
/// array position, which puts the new item last among equals.
pub fn insert_with_id<T: Orderable>(items: &[T], id: String) -> Vec<T> {
    let mut out = items.to_vec();
    let order = out.len() as i64 + 1;
    out.push(T::new_item(id, order));
    out
}

/// Remove the first item with `id`. Remaining orders are not renumbered.
pub fn remove<T: Orderable>(items: &[T], id: &str) -> Vec<T> {
    let mut out = items.to_vec();
    if let Some(pos) = out.iter().position(|i| i.id() == id) {
        out.remove(pos);
    }
    out
}

/// Give id-less items a fresh id.
///
/// Archive entries predating ids come back with an empty id and `order` 0.
/// Such items also take `position + 1` as their order, which preserves the
/// sequence they were stored in.
pub fn assign_missing_ids<T: Orderable>(items: &[T]) -> Vec<T> {
    let mut out = items.to_vec();
    for (pos, item) in out.iter_mut().enumerate() {
        if item.id().is_empty() {
            item.set_id(new_item_id(T::ID_PREFIX));
            if item.order() == 0 {
                item.set_order(pos as i64 + 1);
            }
        }
    }
    out
}

static ID_GENERATOR: LazyLock<Mutex<Generator>> = LazyLock::new(|| Mutex::new(Generator::new()));

/// A new unique id: `{prefix}_{ulid}` in lower case.
///
/// ULIDs embed the creation time and are monotonic within this process, so
/// ids sort by creation and are never handed out twice.
pub fn new_item_id(prefix: &str) -> String {
    let ulid = {
        let mut generator = ID_GENERATOR.lock().unwrap_or_else(|e| e.into_inner());
        generator.generate().unwrap_or_else(|_| Ulid::new())
    };
    format!("{}_{}", prefix, ulid.to_string().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ArchiveEntry, NavItem, Poem};
    use std::collections::HashSet;

    fn poem(id: &str, order: i64, enabled: bool) -> Poem {
        Poem {
            id: id.into(),
            title: id.to_uppercase(),
            enabled,
            order,
            stanzas: vec![],
        }
    }

    fn ids<T: Orderable>(items: &[T]) -> Vec<&str> {
        items.iter().map(|i| i.id()).collect()
    }

    fn orders<T: Orderable>(items: &[T]) -> Vec<(String, i64)> {
        let mut v: Vec<_> = items.iter().map(|i| (i.id().to_string(), i.order())).collect();
        v.sort();
        v
    }

    // =========================================================================
    // Views
    // =========================================================================

    #[test]
    fn public_view_filters_and_sorts() {
        let items = vec![
            poem("c", 3, true),
            poem("a", 1, true),
            poem("hidden", 0, false),
            poem("b", 2, true),
        ];
        assert_eq!(ids(&public_view(&items)), vec!["a", "b", "c"]);
    }

    #[test]
    fn public_view_ties_keep_array_position() {
        let items = vec![poem("x", 5, true), poem("y", 1, true), poem("z", 5, true)];
        assert_eq!(ids(&public_view(&items)), vec!["y", "x", "z"]);
    }

    #[test]
    fn public_view_tolerates_gaps_and_negative_orders() {
        let items = vec![poem("a", 40, true), poem("b", -3, true), poem("c", 7, true)];
        let view = public_view(&items);
        assert_eq!(ids(&view), vec!["b", "c", "a"]);
        assert!(view.windows(2).all(|w| w[0].order <= w[1].order));
    }

    #[test]
    fn sorted_keeps_disabled_items() {
        let items = vec![poem("b", 2, false), poem("a", 1, true)];
        assert_eq!(ids(&sorted(&items)), vec!["a", "b"]);
    }

    // =========================================================================
    // move_adjacent
    // =========================================================================

    #[test]
    fn move_up_swaps_two_orders() {
        let items = vec![poem("a", 1, true), poem("b", 2, true), poem("c", 3, true)];
        let moved = move_adjacent(&items, "c", Direction::Up);
        assert_eq!(ids(&moved), vec!["a", "c", "b"]);
        assert_eq!(
            orders(&moved),
            vec![("a".into(), 1), ("b".into(), 3), ("c".into(), 2)]
        );
    }

    #[test]
    fn move_changes_exactly_two_items() {
        let items = vec![
            poem("a", 10, true),
            poem("b", 20, true),
            poem("c", 35, true),
            poem("d", 90, true),
        ];
        let moved = move_adjacent(&items, "b", Direction::Down);
        let before = orders(&items);
        let after = orders(&moved);
        let changed: Vec<_> = before
            .iter()
            .zip(after.iter())
            .filter(|(x, y)| x != y)
            .map(|(x, _)| x.0.as_str())
            .collect();
        assert_eq!(changed, vec!["b", "c"]);
        assert_eq!(ids(&public_view(&moved)), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn move_uses_order_not_array_position() {
        // Stored out of order: display is a, b, c.
        let items = vec![poem("c", 3, true), poem("a", 1, true), poem("b", 2, true)];
        let moved = move_adjacent(&items, "a", Direction::Down);
        assert_eq!(ids(&moved), vec!["b", "a", "c"]);
    }

    #[test]
    fn move_first_up_is_noop() {
        let items = vec![poem("b", 2, true), poem("a", 1, true)];
        let moved = move_adjacent(&items, "a", Direction::Up);
        assert_eq!(moved, items);
    }

    #[test]
    fn move_last_down_is_noop() {
        let items = vec![poem("a", 1, true), poem("b", 2, true)];
        let moved = move_adjacent(&items, "b", Direction::Down);
        assert_eq!(moved, items);
    }

    #[test]
    fn move_unknown_id_is_noop() {
        let items = vec![poem("a", 1, true), poem("b", 2, true)];
        assert_eq!(move_adjacent(&items, "zzz", Direction::Up), items);
    }

    #[test]
    fn move_considers_disabled_neighbours() {
        let items = vec![poem("a", 1, true), poem("b", 2, false), poem("c", 3, true)];
        let moved = move_adjacent(&items, "c", Direction::Up);
        assert_eq!(ids(&moved), vec!["a", "c", "b"]);
        assert_eq!(ids(&public_view(&moved)), vec!["a", "c"]);
    }

    #[test]
    fn move_between_tied_orders_swaps_positions() {
        let items = vec![poem("a", 1, true), poem("b", 1, true)];
        let moved = move_adjacent(&items, "b", Direction::Up);
        assert_eq!(ids(&moved), vec!["b", "a"]);
        assert_eq!(ids(&public_view(&moved)), vec!["b", "a"]);
    }

    // =========================================================================
    // toggle / insert / remove
    // =========================================================================

    #[test]
    fn toggle_flips_one_item() {
        let items = vec![poem("a", 1, true), poem("b", 2, true)];
        let toggled = toggle_enabled(&items, "b");
        assert!(toggled[0].enabled);
        assert!(!toggled[1].enabled);
        assert_eq!(toggled[1].order, 2);

        let back = toggle_enabled(&toggled, "b");
        assert_eq!(back, items);
    }

    #[test]
    fn insert_appends_enabled_at_count_plus_one() {
        let items = vec![poem("a", 1, true), poem("b", 7, false)];
        let out = insert(&items);
        assert_eq!(out.len(), 3);
        let new = &out[2];
        assert!(new.id.starts_with("poem_"));
        assert!(new.enabled);
        assert_eq!(new.order, 3);
        assert_eq!(new.title, "New Poem");
    }

    #[test]
    fn insert_after_removal_can_tie_and_sorts_last() {
        let items = vec![poem("a", 1, true), poem("b", 2, true), poem("c", 3, true)];
        let out = remove(&items, "a");
        let out = insert_with_id(&out, "new".into());
        assert_eq!(out[2].order, 3);
        assert_eq!(ids(&public_view(&out)), vec!["b", "c", "new"]);
    }

    #[test]
    fn remove_does_not_renumber() {
        let items = vec![poem("a", 1, true), poem("b", 2, true), poem("c", 3, true)];
        let out = remove(&items, "b");
        assert_eq!(
            orders(&out),
            vec![("a".into(), 1), ("c".into(), 3)]
        );
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let items = vec![poem("a", 1, true)];
        assert_eq!(remove(&items, "nope"), items);
    }

    #[test]
    fn apply_dispatches_each_op() {
        let items = vec![
            NavItem {
                id: "read".into(),
                label: "Read".into(),
                href: "/read".into(),
                enabled: true,
                order: 1,
            },
            NavItem {
                id: "about".into(),
                label: "About".into(),
                href: "/about".into(),
                enabled: true,
                order: 2,
            },
        ];
        let out = apply(
            &items,
            &CollectionOp::Move {
                id: "about".into(),
                direction: Direction::Up,
            },
        );
        assert_eq!(ids(&out), vec!["about", "read"]);

        let out = apply(&out, &CollectionOp::Toggle { id: "read".into() });
        assert_eq!(ids(&public_view(&out)), vec!["about"]);

        let out = apply(&out, &CollectionOp::Insert);
        assert_eq!(out.last().map(|n| n.label.as_str()), Some("New Link"));

        let out = apply(&out, &CollectionOp::Remove { id: "read".into() });
        assert_eq!(out.len(), 2);
    }

    // =========================================================================
    // ids
    // =========================================================================

    #[test]
    fn new_ids_are_unique_and_prefixed() {
        let ids: HashSet<String> = (0..500).map(|_| new_item_id("rec")).collect();
        assert_eq!(ids.len(), 500);
        assert!(ids.iter().all(|id| id.starts_with("rec_") && id.len() == 30));
    }

    #[test]
    fn new_ids_sort_by_creation() {
        let first = new_item_id("book");
        let second = new_item_id("book");
        assert!(first < second);
    }

    #[test]
    fn assign_missing_ids_uses_position_for_order() {
        let entries = vec![
            ArchiveEntry {
                title: "One".into(),
                enabled: true,
                ..Default::default()
            },
            ArchiveEntry {
                id: "entry_kept".into(),
                title: "Two".into(),
                order: 9,
                enabled: true,
                ..Default::default()
            },
            ArchiveEntry {
                title: "Three".into(),
                enabled: true,
                ..Default::default()
            },
        ];
        let out = assign_missing_ids(&entries);
        assert!(out[0].id.starts_with("entry_"));
        assert_eq!(out[0].order, 1);
        assert_eq!(out[1].id, "entry_kept");
        assert_eq!(out[1].order, 9);
        assert_eq!(out[2].order, 3);
        assert_ne!(out[0].id, out[2].id);
    }

    #[test]
    fn direction_parses() {
        assert_eq!("up".parse::<Direction>(), Ok(Direction::Up));
        assert_eq!("down".parse::<Direction>(), Ok(Direction::Down));
        assert!("left".parse::<Direction>().is_err());
        assert_eq!(Direction::Down.to_string(), "down");
    }
}
