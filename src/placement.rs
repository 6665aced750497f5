//! Edge to layout mapping for notification views.

use serde::Serialize;

use crate::types::Edge;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    CenterLeft,
    TopCenter,
    CenterRight,
    BottomCenter,
}

/// Direction in which simultaneous messages pile up from the anchor.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackDirection {
    Down,
    Up,
}

/// Constraints the host applies to a notification view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct Layout {
    pub edge: Edge,
    pub anchor: Anchor,
    pub stack: StackDirection,
    pub margin: u16,
    pub spacing: u16,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlacementPolicy {
    margin: u16,
    spacing: u16,
}

impl PlacementPolicy {
    #[must_use]
    pub const fn new(margin: u16, spacing: u16) -> Self {
        Self { margin, spacing }
    }

    #[must_use]
    pub const fn layout(&self, edge: Edge) -> Layout {
        let (anchor, stack) = match edge {
            Edge::Left => (Anchor::CenterLeft, StackDirection::Down),
            Edge::Top => (Anchor::TopCenter, StackDirection::Down),
            Edge::Right => (Anchor::CenterRight, StackDirection::Down),
            Edge::Bottom => (Anchor::BottomCenter, StackDirection::Up),
        };
        Layout {
            edge,
            anchor,
            stack,
            margin: self.margin,
            spacing: self.spacing,
        }
    }
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self::new(12, 6)
    }
}

#[cfg(test)]
mod tests {
    use super::{Anchor, PlacementPolicy, StackDirection};
    use crate::types::Edge;

    #[test]
    fn bottom_edge_stacks_upwards() {
        let layout = PlacementPolicy::default().layout(Edge::Bottom);
        assert_eq!(layout.anchor, Anchor::BottomCenter);
        assert_eq!(layout.stack, StackDirection::Up);
    }

    #[test]
    fn layout_is_deterministic() {
        let policy = PlacementPolicy::new(4, 2);
        for edge in [Edge::Left, Edge::Top, Edge::Right, Edge::Bottom] {
            assert_eq!(policy.layout(edge), policy.layout(edge));
            assert_eq!(policy.layout(edge).edge, edge);
        }
    }

    #[test]
    fn right_edge_layout_snapshot() {
        insta::assert_json_snapshot!(PlacementPolicy::new(12, 6).layout(Edge::Right), @r###"
        {
          "edge": "right",
          "anchor": "center_right",
          "stack": "down",
          "margin": 12,
          "spacing": 6
        }
        "###);
    }
}
