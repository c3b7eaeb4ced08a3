//! Range queries
//!
//! A query walks the cells covered by a rectangle, yields the entities in
//! their buckets and keeps those whose bounds overlap the rectangle and pass
//! the caller's filter. Results are produced lazily.
//!
//! Cells are visited column-major (columns ascending, then rows ascending) and
//! entities inside a cell by ascending id, so for a fixed grid state the order
//! is always the same. Each entity lives in one bucket, so it is yielded at
//! most once.
//!
//! A rectangle lying entirely outside the grid yields nothing, even though
//! clamping it would land on an edge cell.

use crate::bucket::Buckets;
use crate::cell::{CellLayout, CellRect};
use crate::entity::{EntityId, EntityProxy};
use crate::grid::SpatialGrid;
use crate::math::Aabb;
use crate::metrics::GridEvent;
use glam::Vec2;
use std::collections::btree_map;

/// Query described as an object: two corners and a filter.
pub trait SpatialQuery {
    fn aabb_from(&self) -> Vec2;

    fn aabb_to(&self) -> Vec2;

    /// Extra test applied after the bounds check, over `(position, radius)`.
    fn filter(&self, position: Vec2, radius: f32) -> bool;
}

/// Owned [`SpatialQuery`] built from a closure.
#[derive(Debug, Clone)]
pub struct AabbQuery<F> {
    pub from: Vec2,
    pub to: Vec2,
    pub filter: F,
}

impl<F> AabbQuery<F>
where
    F: Fn(Vec2, f32) -> bool,
{
    pub fn new(from: Vec2, to: Vec2, filter: F) -> Self {
        Self { from, to, filter }
    }
}

impl<F> SpatialQuery for AabbQuery<F>
where
    F: Fn(Vec2, f32) -> bool,
{
    fn aabb_from(&self) -> Vec2 {
        self.from
    }

    fn aabb_to(&self) -> Vec2 {
        self.to
    }

    fn filter(&self, position: Vec2, radius: f32) -> bool {
        (self.filter)(position, radius)
    }
}

fn accept_all(_position: Vec2, _radius: f32) -> bool {
    true
}

/// Lazy query result. Single pass; run the query again for a fresh sequence.
pub struct Query<'a, H, F> {
    layout: &'a CellLayout,
    buckets: &'a Buckets<H>,
    cells: CellRect,
    bucket: Option<btree_map::Values<'a, EntityId, H>>,
    bounds: Aabb,
    filter: F,
}

impl<'a, H, F> Iterator for Query<'a, H, F>
where
    H: EntityProxy,
    F: Fn(Vec2, f32) -> bool,
{
    type Item = &'a H;

    fn next(&mut self) -> Option<&'a H> {
        loop {
            if let Some(bucket) = &mut self.bucket {
                for entity in bucket.by_ref() {
                    if accepts(&self.bounds, &self.filter, entity) {
                        return Some(entity);
                    }
                }
            }
            let cell = self.cells.next()?;
            let buckets = self.buckets;
            self.bucket = self.layout.index_of(cell).map(|index| buckets.iter(index));
        }
    }
}

fn accepts<H, F>(bounds: &Aabb, filter: &F, entity: &H) -> bool
where
    H: EntityProxy,
    F: Fn(Vec2, f32) -> bool,
{
    let position = entity.position();
    let radius = entity.radius();
    Aabb::around(position, radius).overlaps(bounds) && filter(position, radius)
}

impl<H: EntityProxy> SpatialGrid<H> {
    /// Entities whose `position ± radius` overlaps the rectangle spanned by the
    /// two corners (in any order) and that pass `filter`.
    pub fn query<F>(&self, aabb_from: Vec2, aabb_to: Vec2, filter: F) -> Query<'_, H, F>
    where
        F: Fn(Vec2, f32) -> bool,
    {
        self.counters().increment(GridEvent::Query);

        let layout = self.layout();
        let bounds = Aabb::from_corners(aabb_from, aabb_to);
        let cells = if !aabb_from.is_nan() && !aabb_to.is_nan() {
            covered_cells(layout, &bounds)
        } else {
            CellRect::empty()
        };
        tracing::trace!(
            "grid {}: query {}..{} scans {} cells",
            self.id().id(),
            bounds.min,
            bounds.max,
            cells.len()
        );

        Query {
            layout,
            buckets: self.buckets(),
            cells,
            bucket: None,
            bounds,
            filter,
        }
    }

    /// Same as [`query`](Self::query), taking the parameters from a query object.
    pub fn query_with<'a, Q>(&'a self, query: &'a Q) -> Query<'a, H, impl Fn(Vec2, f32) -> bool + 'a>
    where
        Q: SpatialQuery + ?Sized,
    {
        self.query(query.aabb_from(), query.aabb_to(), move |position, radius| {
            query.filter(position, radius)
        })
    }

    /// Every entity overlapping the rectangle.
    pub fn query_all(&self, aabb_from: Vec2, aabb_to: Vec2) -> Query<'_, H, fn(Vec2, f32) -> bool> {
        self.query(aabb_from, aabb_to, accept_all as fn(Vec2, f32) -> bool)
    }
}

/// Cells the rectangle touches, clamped to the grid. Empty when the rectangle
/// is entirely outside: that check runs before clamping, otherwise a rectangle
/// left of or below the grid would collapse onto the edge cells.
fn covered_cells(layout: &CellLayout, bounds: &Aabb) -> CellRect {
    let from = layout.cell_of(bounds.min);
    let to = layout.cell_of(bounds.max);
    let counts = layout.counts();

    if to.col < 0 || to.row < 0 || from.col >= counts.x || from.row >= counts.y {
        return CellRect::empty();
    }
    CellRect::new(layout.clamp(from), layout.clamp(to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityIdAllocator, GridEntity};
    use glam::UVec2;
    use std::collections::BTreeSet;

    struct Fixture {
        grid: SpatialGrid<GridEntity>,
        ids: EntityIdAllocator,
        entities: Vec<GridEntity>,
    }

    impl Fixture {
        /// origin (0,0), extent (10,10), 2x2 cells of 5x5
        fn new() -> Self {
            Self {
                grid: SpatialGrid::new(Vec2::ZERO, Vec2::splat(10.0), UVec2::new(2, 2)).unwrap(),
                ids: EntityIdAllocator::new(),
                entities: Vec::new(),
            }
        }

        fn spawn(&mut self, x: f32, y: f32, radius: f32) -> EntityId {
            let e = GridEntity::new(self.ids.allocate(), Vec2::new(x, y), radius);
            self.grid.add_entity(&e);
            let id = e.id();
            self.entities.push(e);
            id
        }
    }

    fn ids<'a>(it: impl Iterator<Item = &'a GridEntity>) -> Vec<EntityId> {
        it.map(|e| e.id()).collect()
    }

    fn id_set<'a>(it: impl Iterator<Item = &'a GridEntity>) -> BTreeSet<EntityId> {
        it.map(|e| e.id()).collect()
    }

    #[test]
    fn whole_grid_query_finds_everything() {
        let mut f = Fixture::new();
        let a = f.spawn(2.0, 2.0, 0.5);
        let b = f.spawn(7.0, 7.0, 0.5);

        let found = ids(f.grid.query(Vec2::ZERO, Vec2::splat(10.0), |_, _| true));
        assert_eq!(found, vec![a, b]);
    }

    #[test]
    fn partial_query_finds_only_overlapping_cell() {
        let mut f = Fixture::new();
        let a = f.spawn(2.0, 2.0, 0.5);
        f.spawn(7.0, 7.0, 0.5);

        let found = ids(f.grid.query_all(Vec2::ZERO, Vec2::splat(4.0)));
        assert_eq!(found, vec![a]);
    }

    #[test]
    fn precise_bounds_filter_within_a_cell() {
        let mut f = Fixture::new();
        let near = f.spawn(1.0, 1.0, 0.5);
        f.spawn(4.0, 4.0, 0.5);

        let found = ids(f.grid.query_all(Vec2::ZERO, Vec2::splat(2.0)));
        assert_eq!(found, vec![near]);
    }

    #[test]
    fn radius_extends_the_overlap() {
        let mut f = Fixture::new();
        let big = f.spawn(4.0, 4.0, 2.0);
        f.spawn(4.5, 4.5, 0.1);

        // touching counts: 4.0 - 2.0 == 2.0
        let found = ids(f.grid.query_all(Vec2::ZERO, Vec2::splat(2.0)));
        assert_eq!(found, vec![big]);
    }

    #[test]
    fn corner_order_does_not_matter() {
        let mut f = Fixture::new();
        f.spawn(1.0, 8.0, 0.5);
        f.spawn(3.0, 3.0, 0.5);
        f.spawn(6.0, 6.0, 1.0);
        f.spawn(9.0, 1.0, 0.5);

        let a = Vec2::new(0.5, 9.0);
        let b = Vec2::new(6.5, 2.0);
        let c = Vec2::new(6.5, 9.0);
        let d = Vec2::new(0.5, 2.0);
        let expected = id_set(f.grid.query_all(d, c));
        assert_eq!(expected.len(), 3);
        assert_eq!(id_set(f.grid.query_all(a, b)), expected);
        assert_eq!(id_set(f.grid.query_all(b, a)), expected);
        assert_eq!(id_set(f.grid.query_all(c, d)), expected);
    }

    #[test]
    fn filter_runs_after_bounds() {
        let mut f = Fixture::new();
        f.spawn(2.0, 2.0, 0.5);
        let big = f.spawn(7.0, 7.0, 3.0);

        let none = f.grid.query(Vec2::ZERO, Vec2::splat(10.0), |_, _| false);
        assert_eq!(none.count(), 0);

        let found = ids(f.grid.query(Vec2::ZERO, Vec2::splat(10.0), |_, r| r > 1.0));
        assert_eq!(found, vec![big]);
    }

    #[test]
    fn filter_sees_position_and_radius() {
        let mut f = Fixture::new();
        f.spawn(2.0, 2.0, 0.5);
        let right = f.spawn(8.0, 2.0, 0.5);

        let found = ids(f.grid.query(Vec2::ZERO, Vec2::splat(10.0), |p, _| p.x > 5.0));
        assert_eq!(found, vec![right]);
    }

    #[test]
    fn order_is_column_major_then_by_id() {
        let mut f = Fixture::new();
        let top_right = f.spawn(8.0, 8.0, 0.1);
        let bottom_left_2 = f.spawn(3.0, 3.0, 0.1);
        let top_left = f.spawn(2.0, 8.0, 0.1);
        let bottom_right = f.spawn(8.0, 2.0, 0.1);
        let bottom_left_1 = f.spawn(1.0, 1.0, 0.1);

        let found = ids(f.grid.query_all(Vec2::ZERO, Vec2::splat(10.0)));
        assert_eq!(
            found,
            vec![bottom_left_2, bottom_left_1, top_left, bottom_right, top_right]
        );
        assert!(bottom_left_2 < bottom_left_1);
        assert_eq!(found, ids(f.grid.query_all(Vec2::ZERO, Vec2::splat(10.0))));
    }

    #[test]
    fn fully_outside_rectangles_are_empty() {
        let mut f = Fixture::new();
        // radius reaches past the left and bottom edges
        f.spawn(0.5, 0.5, 3.0);
        f.spawn(9.5, 9.5, 3.0);

        let outside = [
            (Vec2::new(-8.0, 0.0), Vec2::new(-2.0, 5.0)),
            (Vec2::new(0.0, -8.0), Vec2::new(5.0, -2.0)),
            (Vec2::new(-8.0, -8.0), Vec2::new(-2.0, -2.0)),
            (Vec2::new(11.0, 0.0), Vec2::new(14.0, 10.0)),
            (Vec2::new(0.0, 11.0), Vec2::new(10.0, 14.0)),
            (Vec2::new(10.0, 10.0), Vec2::new(12.0, 12.0)),
        ];
        for (from, to) in outside {
            assert_eq!(f.grid.query_all(from, to).count(), 0, "{from}..{to}");
        }
    }

    #[test]
    fn partially_outside_rectangles_still_scan_overlapping_cells() {
        let mut f = Fixture::new();
        let low = f.spawn(0.5, 0.5, 0.5);
        let high = f.spawn(9.5, 9.5, 0.5);

        let found = ids(f.grid.query_all(Vec2::new(-100.0, -100.0), Vec2::new(1.0, 1.0)));
        assert_eq!(found, vec![low]);

        let found = ids(f.grid.query_all(Vec2::new(9.0, 9.0), Vec2::new(100.0, 100.0)));
        assert_eq!(found, vec![high]);

        let found = ids(f.grid.query_all(Vec2::splat(-1.0e9), Vec2::splat(1.0e9)));
        assert_eq!(found, vec![low, high]);
    }

    #[test]
    fn rectangle_touching_the_near_edge_scans_it() {
        let mut f = Fixture::new();
        let e = f.spawn(0.5, 2.0, 1.0);

        let found = ids(f.grid.query_all(Vec2::new(-3.0, 0.0), Vec2::new(0.0, 5.0)));
        assert_eq!(found, vec![e]);
    }

    #[test]
    fn nan_corners_are_empty() {
        let mut f = Fixture::new();
        f.spawn(2.0, 2.0, 0.5);

        assert_eq!(f.grid.query_all(Vec2::new(f32::NAN, 0.0), Vec2::splat(10.0)).count(), 0);
        assert_eq!(f.grid.query_all(Vec2::ZERO, Vec2::new(3.0, f32::NAN)).count(), 0);
    }

    #[test]
    fn infinite_corners_behave_like_huge_ones() {
        let mut f = Fixture::new();
        let a = f.spawn(2.0, 2.0, 0.5);
        let b = f.spawn(8.0, 3.0, 0.5);

        let everything = ids(f.grid.query_all(Vec2::NEG_INFINITY, Vec2::INFINITY));
        assert_eq!(everything, vec![a, b]);
        assert_eq!(everything, ids(f.grid.query_all(Vec2::MIN, Vec2::MAX)));

        let left_half = ids(f.grid.query_all(Vec2::NEG_INFINITY, Vec2::new(4.0, f32::INFINITY)));
        assert_eq!(left_half, vec![a]);

        // an unbounded rectangle entirely past the far edge still misses the grid
        let past_end = f.grid.query_all(Vec2::new(11.0, f32::NEG_INFINITY), Vec2::INFINITY);
        assert_eq!(past_end.count(), 0);
    }

    #[test]
    fn entities_outside_the_grid_are_never_returned() {
        let mut f = Fixture::new();
        f.spawn(-1.0, 2.0, 2.0);

        assert_eq!(f.grid.query_all(Vec2::splat(-5.0), Vec2::splat(5.0)).count(), 0);
    }

    #[test]
    fn removed_entities_are_never_returned() {
        let mut f = Fixture::new();
        let keep = f.spawn(2.0, 2.0, 0.5);
        f.spawn(3.0, 3.0, 0.5);

        let gone = f.entities[1].clone();
        f.grid.remove_entity(&gone);
        gone.set_position(Vec2::new(7.0, 7.0));
        f.grid.process_moves();

        let found = ids(f.grid.query_all(Vec2::ZERO, Vec2::splat(10.0)));
        assert_eq!(found, vec![keep]);
    }

    #[test]
    fn query_follows_moves() {
        let mut f = Fixture::new();
        let id = f.spawn(2.0, 2.0, 0.5);
        let e = f.entities[0].clone();

        e.set_position(Vec2::new(8.0, 8.0));
        f.grid.process_moves();

        assert_eq!(f.grid.query_all(Vec2::ZERO, Vec2::splat(4.0)).count(), 0);
        assert_eq!(ids(f.grid.query_all(Vec2::splat(6.0), Vec2::splat(10.0))), vec![id]);
    }

    #[test]
    fn query_object_matches_direct_call() {
        let mut f = Fixture::new();
        f.spawn(1.0, 1.0, 0.5);
        let wide = f.spawn(6.0, 2.0, 2.0);
        f.spawn(8.0, 8.0, 0.5);

        let q = AabbQuery::new(Vec2::new(9.0, 0.0), Vec2::new(0.0, 4.0), |_: Vec2, r: f32| r > 1.0);
        let via_object = ids(f.grid.query_with(&q));
        let direct = ids(f.grid.query(q.from, q.to, |_, r| r > 1.0));
        assert_eq!(via_object, vec![wide]);
        assert_eq!(via_object, direct);

        let dynamic: &dyn SpatialQuery = &q;
        assert_eq!(ids(f.grid.query_with(dynamic)), direct);
    }

    #[test]
    fn offset_grid_queries() {
        let mut grid: SpatialGrid<GridEntity> =
            SpatialGrid::new(Vec2::new(-100.0, 50.0), Vec2::new(200.0, 100.0), UVec2::new(8, 4))
                .unwrap();
        let mut ids_alloc = EntityIdAllocator::new();
        let a = GridEntity::new(ids_alloc.allocate(), Vec2::new(-90.0, 60.0), 1.0);
        let b = GridEntity::new(ids_alloc.allocate(), Vec2::new(95.0, 140.0), 1.0);
        let c = GridEntity::new(ids_alloc.allocate(), Vec2::new(0.0, 100.0), 1.0);
        for e in [&a, &b, &c] {
            grid.add_entity(e);
        }

        let found = ids(grid.query_all(Vec2::new(-10.0, 90.0), Vec2::new(10.0, 110.0)));
        assert_eq!(found, vec![c.id()]);
        assert_eq!(grid.query_all(grid.origin(), grid.end()).count(), 3);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn queries_are_counted() {
        let f = Fixture::new();
        let _ = f.grid.query_all(Vec2::ZERO, Vec2::ONE).count();
        let _ = f.grid.query_all(Vec2::splat(-5.0), Vec2::splat(-1.0)).count();
        assert_eq!(f.grid.counters().get(GridEvent::Query), 2);
    }
}
