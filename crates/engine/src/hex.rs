//! Cube-coordinate hex grid math: construction, neighbors, distance, line-draw, A*.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use serde::{Deserialize, Serialize};

/// A cell on the cube-coordinate hex grid. Invariant: `q + r + s == 0`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

/// The six canonical cube-coordinate directions, in a stable order used for
/// tie-breaking and for `neighbors()`.
pub const DIRECTIONS: [Hex; 6] = [
    Hex { q: 1, r: 0, s: -1 },
    Hex { q: 1, r: -1, s: 0 },
    Hex { q: 0, r: -1, s: 1 },
    Hex { q: -1, r: 0, s: 1 },
    Hex { q: -1, r: 1, s: 0 },
    Hex { q: 0, r: 1, s: -1 },
];

impl Hex {
    /// Construct from cube coordinates. Panics (programming error, not
    /// caller input) if the invariant is violated.
    pub fn new(q: i32, r: i32, s: i32) -> Self {
        debug_assert_eq!(q + r + s, 0, "hex coordinate invariant violated: q+r+s != 0");
        Hex { q, r, s }
    }

    /// Construct from axial coordinates, deriving `s`.
    pub fn from_axial(q: i32, r: i32) -> Self {
        Hex { q, r, s: -q - r }
    }

    /// Construct from "odd-r" offset coordinates (flat layout used by the
    /// rectangular `Map` in this engine).
    pub fn from_offset(col: i32, row: i32) -> Self {
        let q = col - (row - (row & 1)) / 2;
        let r = row;
        Hex::from_axial(q, r)
    }

    /// Convert to "odd-r" offset (col, row) coordinates.
    pub fn to_offset(self) -> (i32, i32) {
        let col = self.q + (self.r - (self.r & 1)) / 2;
        let row = self.r;
        (col, row)
    }

    pub fn try_new(q: i32, r: i32, s: i32) -> Option<Self> {
        if q + r + s == 0 {
            Some(Hex { q, r, s })
        } else {
            None
        }
    }

    pub fn add(self, other: Hex) -> Hex {
        Hex::new(self.q + other.q, self.r + other.r, self.s + other.s)
    }

    pub fn sub(self, other: Hex) -> Hex {
        Hex::new(self.q - other.q, self.r - other.r, self.s - other.s)
    }

    pub fn scale(self, k: i32) -> Hex {
        Hex::new(self.q * k, self.r * k, self.s * k)
    }

    /// The six neighbors, in canonical direction order.
    pub fn neighbors(self) -> [Hex; 6] {
        let mut out = [self; 6];
        for (i, dir) in DIRECTIONS.iter().enumerate() {
            out[i] = self.add(*dir);
        }
        out
    }

    pub fn neighbor(self, direction: usize) -> Hex {
        self.add(DIRECTIONS[direction % 6])
    }

    /// Canonical cube distance: `max(|q|, |r|, |s|)`. This is the only
    /// distance formula used anywhere in this codebase.
    pub fn distance(self, other: Hex) -> i32 {
        let d = self.sub(other);
        d.q.abs().max(d.r.abs()).max(d.s.abs())
    }

    /// All hexes at exactly `radius` from `self`.
    pub fn ring(self, radius: i32) -> Vec<Hex> {
        if radius == 0 {
            return vec![self];
        }
        let mut results = Vec::with_capacity((6 * radius) as usize);
        let mut hex = self.add(DIRECTIONS[4].scale(radius));
        for direction in 0..6 {
            for _ in 0..radius {
                results.push(hex);
                hex = hex.neighbor(direction);
            }
        }
        results
    }

    /// All hexes within `radius` (inclusive), including `self`.
    pub fn range(self, radius: i32) -> Vec<Hex> {
        let mut results = Vec::new();
        for q in -radius..=radius {
            let r_min = (-radius).max(-q - radius);
            let r_max = radius.min(-q + radius);
            for r in r_min..=r_max {
                let s = -q - r;
                results.push(self.add(Hex::new(q, r, s)));
            }
        }
        results
    }

    fn lerp(a: f64, b: f64, t: f64) -> f64 {
        a + (b - a) * t
    }

    fn round(fq: f64, fr: f64, fs: f64) -> Hex {
        let mut q = fq.round();
        let mut r = fr.round();
        let s = fs.round();

        let q_diff = (q - fq).abs();
        let r_diff = (r - fr).abs();
        let s_diff = (s - fs).abs();

        if q_diff > r_diff && q_diff > s_diff {
            q = -r - s;
        } else if r_diff > s_diff {
            r = -q - s;
        } else {
            // s recomputed implicitly via Hex::new below
        }
        Hex::new(q as i32, r as i32, -(q as i32) - (r as i32))
    }

    /// Linear-interpolation + cube-rounding line draw from `self` to `other`,
    /// inclusive of both endpoints. `line(a,b) == reverse(line(b,a))` up to
    /// tie-break-equivalent hexes.
    pub fn line_to(self, other: Hex) -> Vec<Hex> {
        let n = self.distance(other);
        if n == 0 {
            return vec![self];
        }
        // Nudge endpoints a hair off-center so rounding ties break
        // consistently regardless of direction of travel.
        const EPS: f64 = 1e-6;
        let a = (self.q as f64 + EPS, self.r as f64 + EPS, self.s as f64 - 2.0 * EPS);
        let b = (other.q as f64 + EPS, other.r as f64 + EPS, other.s as f64 - 2.0 * EPS);

        (0..=n)
            .map(|i| {
                let t = i as f64 / n as f64;
                let fq = Hex::lerp(a.0, b.0, t);
                let fr = Hex::lerp(a.1, b.1, t);
                let fs = Hex::lerp(a.2, b.2, t);
                Hex::round(fq, fr, fs)
            })
            .collect()
    }
}

/// Result of an `a_star` search.
#[derive(Clone, Debug, Default)]
pub struct PathResult {
    /// Path including `start` and `goal`, empty if unreachable.
    pub hexes: Vec<Hex>,
    pub total_cost: u32,
}

impl PathResult {
    pub fn is_empty(&self) -> bool {
        self.hexes.is_empty()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct QueueEntry {
    priority: u32,
    heuristic: u32,
    order: u64,
    hex: Hex,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the lowest priority pops first.
        // Tie-break: lower heuristic first, then stable (earlier) insertion order.
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.heuristic.cmp(&self.heuristic))
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* path-find from `start` to `goal`. `cost_oracle(hex)` returns `None` if
/// the hex is impassable, else the cost to enter it; it is consulted per
/// destination hex, not per edge. Returns an empty `PathResult` if `goal` is
/// unreachable or exceeds `max_cost`.
pub fn a_star(
    start: Hex,
    goal: Hex,
    max_cost: Option<u32>,
    mut cost_oracle: impl FnMut(Hex) -> Option<u32>,
) -> PathResult {
    if start == goal {
        return PathResult {
            hexes: vec![start],
            total_cost: 0,
        };
    }

    let mut open = BinaryHeap::new();
    let mut came_from: HashMap<Hex, Hex> = HashMap::new();
    let mut cost_so_far: HashMap<Hex, u32> = HashMap::new();
    let mut order_counter: u64 = 0;

    cost_so_far.insert(start, 0);
    open.push(QueueEntry {
        priority: heuristic(start, goal),
        heuristic: heuristic(start, goal),
        order: order_counter,
        hex: start,
    });

    while let Some(QueueEntry { hex: current, .. }) = open.pop() {
        if current == goal {
            break;
        }
        let current_cost = cost_so_far[&current];

        for next in current.neighbors() {
            let Some(step_cost) = cost_oracle(next) else {
                continue;
            };
            let new_cost = current_cost + step_cost;
            if let Some(max) = max_cost {
                if new_cost > max {
                    continue;
                }
            }
            let better = match cost_so_far.get(&next) {
                Some(&existing) => new_cost < existing,
                None => true,
            };
            if better {
                cost_so_far.insert(next, new_cost);
                came_from.insert(next, current);
                order_counter += 1;
                let h = heuristic(next, goal);
                open.push(QueueEntry {
                    priority: new_cost + h,
                    heuristic: h,
                    order: order_counter,
                    hex: next,
                });
            }
        }
    }

    if !cost_so_far.contains_key(&goal) {
        return PathResult::default();
    }

    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => return PathResult::default(),
        }
    }
    path.reverse();

    PathResult {
        total_cost: cost_so_far[&goal],
        hexes: path,
    }
}

fn heuristic(a: Hex, b: Hex) -> u32 {
    a.distance(b) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invariant_violation_in_debug() {
        // try_new is the panic-free constructor for caller-supplied input.
        assert!(Hex::try_new(1, 1, 1).is_none());
        assert!(Hex::try_new(1, -1, 0).is_some());
    }

    #[test]
    fn distance_is_canonical_cube_max() {
        let a = Hex::new(0, 0, 0);
        let b = Hex::new(3, -1, -2);
        assert_eq!(a.distance(b), 3);
    }

    #[test]
    fn neighbors_are_all_distance_one() {
        let center = Hex::new(1, -1, 0);
        for n in center.neighbors() {
            assert_eq!(center.distance(n), 1);
            assert_eq!(n.q + n.r + n.s, 0);
        }
    }

    #[test]
    fn ring_zero_is_self() {
        let center = Hex::new(0, 0, 0);
        assert_eq!(center.ring(0), vec![center]);
    }

    #[test]
    fn ring_radius_two_has_twelve_hexes() {
        let center = Hex::new(0, 0, 0);
        assert_eq!(center.ring(2).len(), 12);
        for h in center.ring(2) {
            assert_eq!(center.distance(h), 2);
        }
    }

    #[test]
    fn range_includes_center_and_all_rings() {
        let center = Hex::new(0, 0, 0);
        let r = center.range(2);
        assert_eq!(r.len(), 1 + 6 + 12);
    }

    #[test]
    fn line_to_endpoints_match() {
        let a = Hex::new(0, 0, 0);
        let b = Hex::new(3, -3, 0);
        let line = a.line_to(b);
        assert_eq!(*line.first().unwrap(), a);
        assert_eq!(*line.last().unwrap(), b);
        assert_eq!(line.len() as i32, a.distance(b) + 1);
    }

    #[test]
    fn line_to_is_symmetric() {
        let a = Hex::new(1, -2, 1);
        let b = Hex::new(-2, 1, 1);
        let forward = a.line_to(b);
        let mut backward = b.line_to(a);
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn a_star_finds_optimal_unweighted_path() {
        let start = Hex::new(0, 0, 0);
        let goal = Hex::new(2, 0, -2);
        let result = a_star(start, goal, None, |_| Some(1));
        assert_eq!(result.total_cost, 2);
        assert_eq!(result.hexes.first(), Some(&start));
        assert_eq!(result.hexes.last(), Some(&goal));
    }

    #[test]
    fn a_star_respects_blocked_hexes() {
        let start = Hex::new(0, 0, 0);
        let goal = Hex::new(0, 0, 0).neighbor(0);
        let result = a_star(start, goal, None, |_| None);
        assert!(result.is_empty());
    }

    #[test]
    fn a_star_respects_max_cost() {
        let start = Hex::new(0, 0, 0);
        let goal = Hex::new(5, 0, -5);
        let result = a_star(start, goal, Some(2), |_| Some(1));
        assert!(result.is_empty());
    }

    #[test]
    fn offset_round_trip() {
        for q in -3..3 {
            for r in -3..3 {
                let h = Hex::from_axial(q, r);
                let (col, row) = h.to_offset();
                let back = Hex::from_offset(col, row);
                assert_eq!(h, back);
            }
        }
    }
}
