//! Integration tests for the arrangement functions through the public API.
use rawm::{
    geometry::Rect,
    layout::{bstack, bstackhoriz, gaplessgrid, monocle, tile},
};
use simple_test_case::test_case;

type ArrangeFn = fn(u32, Rect, f32, u32) -> Vec<Rect>;

fn area(r: &Rect) -> i64 {
    r.w as i64 * r.h as i64
}

#[test_case(tile; "tile_case")]
#[test_case(bstack; "bstack_case")]
#[test_case(bstackhoriz; "bstackhoriz_case")]
#[test]
fn master_stack_layouts_fill_the_work_area(f: ArrangeFn) {
    let wa = Rect::new(0, 0, 1000, 600);

    for n in 1..=8 {
        let rects = f(n, wa, 0.5, 1);
        let total: i64 = rects.iter().map(area).sum();

        assert_eq!(
            total,
            area(&wa),
            "{n} clients should exactly cover the work area"
        );
    }
}

#[test_case(tile; "tile_case")]
#[test_case(bstack; "bstack_case")]
#[test_case(bstackhoriz; "bstackhoriz_case")]
#[test_case(gaplessgrid; "gaplessgrid_case")]
#[test_case(monocle; "monocle_case")]
#[test]
fn layouts_return_one_rect_per_client(f: ArrangeFn) {
    let wa = Rect::new(10, 20, 777, 555);

    for n in 0..=12 {
        assert_eq!(f(n, wa, 0.55, 2).len(), n as usize);
    }
}

#[test]
fn tile_respects_mfact() {
    let wa = Rect::new(0, 0, 1000, 600);

    let rects = tile(2, wa, 0.7, 1);

    assert_eq!(rects[0].w, 700);
    assert_eq!(rects[1].w, 300);
}

#[test]
fn grid_positions_are_offset_by_the_work_area_origin() {
    let wa = Rect::new(100, 50, 600, 400);

    let rects = gaplessgrid(4, wa, 0.5, 1);

    assert!(rects.iter().all(|r| r.x >= 100 && r.y >= 50));
}
