use std::fmt::Write as _;

use approx::assert_abs_diff_eq;
use insta::assert_snapshot;
use proptest::prelude::*;

use super::*;

fn items(n: usize) -> Vec<DisplayItem> {
    (0..n).map(|i| DisplayItem::new(format!("item-{i}"))).collect()
}

fn config(zoom_percent: f64, zoom_range: f64) -> Config {
    Config {
        icon_size: 48.,
        zoom_enabled: true,
        zoom_percent,
        zoom_range,
        ..Default::default()
    }
}

fn format_layout(layout: &[LayoutItem]) -> String {
    let mut buf = String::new();
    for item in layout {
        writeln!(buf, "x={:.2} scale={:.3}", item.x, item.scale).unwrap();
    }
    buf
}

#[test]
fn empty_items_empty_layout() {
    let layout = compute_layout(&[], &config(1.5, 3.), 100., 10., 12., 1.);
    assert!(layout.is_empty());
}

#[test]
fn rest_positions_without_cursor() {
    let layout = compute_layout(&items(5), &config(1.5, 3.), -1., 10., 12., 1.);
    assert_snapshot!(format_layout(&layout), @r"
    x=12.00 scale=1.000
    x=70.00 scale=1.000
    x=128.00 scale=1.000
    x=186.00 scale=1.000
    x=244.00 scale=1.000
    ");
}

#[test]
fn zoom_disabled_is_rest() {
    let mut config = config(1.5, 3.);
    config.zoom_enabled = false;

    let hovered = compute_layout(&items(5), &config, 152., 10., 12., 1.);
    let rest = compute_layout(&items(5), &config, -1., 10., 12., 1.);
    assert_eq!(hovered, rest);
}

#[test]
fn hover_middle_item() {
    // 第三个图标的中心：128 + 24 = 152
    let layout = compute_layout(&items(5), &config(1.5, 3.), 152., 10., 12., 1.);
    assert_snapshot!(format_layout(&layout), @r"
    x=-12.00 scale=1.000
    x=44.57 scale=1.176
    x=116.00 scale=1.500
    x=203.00 scale=1.176
    x=268.00 scale=1.000
    ");

    assert_abs_diff_eq!(layout[2].scale, 1.5);
    assert_abs_diff_eq!(layout[0].scale, 1., epsilon = 1e-6);
    assert_abs_diff_eq!(layout[4].scale, 1., epsilon = 1e-6);
}

#[test]
fn hover_first_item_leaves_far_end_at_rest() {
    let rest = compute_layout(&items(3), &config(1.5, 3.), -1., 6., 12., 1.);
    let layout = compute_layout(&items(3), &config(1.5, 3.), 36., 6., 12., 1.);
    assert_snapshot!(format_layout(&layout), @r"
    x=0.00 scale=1.500
    x=81.00 scale=1.219
    x=144.00 scale=1.000
    ");

    assert_abs_diff_eq!(layout[2].scale, rest[2].scale);
}

#[test]
fn scale_is_max_on_rest_center() {
    for zoom in [1.25, 1.5, 2.] {
        let layout = compute_layout(&items(5), &config(zoom, 3.), 128. + 24., 10., 12., 1.);
        assert_abs_diff_eq!(layout[2].scale, zoom, epsilon = 1e-9);
    }
}

#[test]
fn scale_is_one_past_zoom_range() {
    // zoom_range 小于 zoom_percent 时，缩放半径取 zoom_range
    let config = config(2., 1.);
    let layout = compute_layout(&items(5), &config, 36., 6., 12., 1.);
    // 第二个图标中心在 12 + 48 + 6 + 24 = 90，距离 54 ≥ 48
    assert_eq!(layout[1].scale, 1.);
    assert_abs_diff_eq!(layout[0].scale, 2.);
}

#[test]
fn midpoint_is_symmetric() {
    // 第二、三个图标的中心分别为 94 和 152
    let layout = compute_layout(&items(5), &config(1.5, 3.), 123., 10., 12., 1.);
    assert_abs_diff_eq!(layout[1].scale, layout[2].scale, epsilon = 1e-9);

    // 两个图标被对称地推开
    let left_shift = 94. - layout[1].center();
    let right_shift = layout[2].center() - 152.;
    assert_abs_diff_eq!(left_shift, right_shift, epsilon = 1e-9);
}

#[test]
fn far_items_shift_by_constant() {
    let config = config(1.5, 3.);
    let rest = compute_layout(&items(8), &config, -1., 10., 12., 1.);
    let hovered = compute_layout(&items(8), &config, 36., 10., 12., 1.);

    let shifts: Vec<f64> = (5..8).map(|i| hovered[i].x - rest[i].x).collect();
    for shift in &shifts {
        assert_abs_diff_eq!(*shift, shifts[0], epsilon = 1e-9);
    }
    for item in &hovered[5..] {
        assert_abs_diff_eq!(item.scale, 1.);
    }
}

#[test]
fn items_push_away_from_cursor() {
    let config = config(1.5, 3.);
    let rest = compute_layout(&items(5), &config, -1., 10., 12., 1.);
    let zoomed = compute_layout(&items(5), &config, 152., 10., 12., 1.);

    assert!(zoomed[0].x <= rest[0].x);
    assert!(zoomed[1].x <= rest[1].x);
    assert!(zoomed[3].x >= rest[3].x);
    assert!(zoomed[4].x >= rest[4].x);
}

#[test]
fn zoom_progress_scales_effect() {
    let config = config(1.5, 3.);
    let half = compute_layout(&items(5), &config, 152., 10., 12., 0.5);
    assert_abs_diff_eq!(half[2].scale, 1.25, epsilon = 1e-9);

    let none = compute_layout(&items(5), &config, 152., 10., 12., 0.);
    let rest = compute_layout(&items(5), &config, -1., 10., 12., 1.);
    for (a, b) in none.iter().zip(&rest) {
        assert_abs_diff_eq!(a.x, b.x, epsilon = 1e-9);
        assert_abs_diff_eq!(a.scale, b.scale);
    }
}

#[test]
fn fixed_size_items_override_spacing_only() {
    let items = vec![
        DisplayItem::new("a"),
        DisplayItem::new("sep").with_main_size(8.),
        DisplayItem::new("b"),
        DisplayItem::new("c"),
    ];
    let config = config(1.5, 3.);

    let rest = compute_layout(&items, &config, -1., 6., 12., 1.);
    let xs: Vec<f64> = rest.iter().map(|item| item.x).collect();
    assert_eq!(xs, [12., 66., 80., 134.]);

    // 光标在分隔符的静止中心 66 + 4 = 70：与普通图标一样放大到 zoom_percent
    let zoomed = compute_layout(&items, &config, 70., 6., 12., 1.);
    assert_eq!(zoomed[1].scale, 1.5);
    // 绘制框为图标大小 × 缩放，以推移后的中心定位
    assert_abs_diff_eq!(zoomed[1].x, 70. - 48. * 1.5 / 2.);
    assert_abs_diff_eq!(zoomed[1].center(), 70.);
    assert_abs_diff_eq!(zoomed[1].extent(), 72.);
    assert!(zoomed[2].scale > 1.);

    // 间距相同时，分隔符与普通图标的缩放一致
    let plain = vec![
        DisplayItem::new("a"),
        DisplayItem::new("x"),
        DisplayItem::new("b"),
        DisplayItem::new("c"),
    ];
    let shifted = compute_layout(&plain, &config, 70. + 20., 6., 12., 1.);
    assert_abs_diff_eq!(zoomed[1].scale, shifted[1].scale, epsilon = 1e-12);
}

#[test]
fn degenerate_sizes_stay_at_rest() {
    let mut config = config(1.5, 3.);
    config.icon_size = 0.;
    let layout = compute_layout(&items(3), &config, 10., 6., 12., 1.);
    for item in &layout {
        assert_eq!(item.scale, 1.);
    }

    let mut config = self::config(f64::NAN, 3.);
    config.icon_size = 48.;
    let layout = compute_layout(&items(3), &config, 10., 6., 12., 1.);
    assert_eq!(layout[0].x, 12.);
    assert_eq!(layout[0].scale, 1.);
}

#[test]
fn content_bounds_empty() {
    let bounds = content_bounds(&[], 12., 0.);
    assert_eq!(bounds, Bounds { left: 0., right: 24. });
}

#[test]
fn content_bounds_single_item() {
    let layout = [LayoutItem {
        x: 12.,
        scale: 1.,
        size: 48.,
    }];
    let bounds = content_bounds(&layout, 12., 0.);
    assert_abs_diff_eq!(bounds.width(), 72.);

    let bounds = content_bounds(&layout, 12., 10.);
    assert_abs_diff_eq!(bounds.left, -5.);
    assert_abs_diff_eq!(bounds.right, 77.);
}

#[test]
fn rest_width_matches_content_bounds() {
    for n in [1, 2, 5, 11] {
        let items = items(n);
        let config = config(1.5, 3.);
        let layout = compute_layout(&items, &config, -1., 10., 12., 1.);
        let bounds = content_bounds(&layout, 12., 10.);

        assert_abs_diff_eq!(bounds.width(), rest_width(&items, 48., 12., 10.), epsilon = 1e-9);

        let rest = rest_bounds(&items, 48., 12., 10.);
        assert_abs_diff_eq!(bounds.left, rest.left, epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.right, rest.right, epsilon = 1e-9);
    }
}

#[test]
fn zoomed_content_is_wider() {
    let config = config(1.3, 3.);
    let items = items(5);
    let rest = content_bounds(&compute_layout(&items, &config, -1., 10., 12., 1.), 12., 10.);
    let zoomed = content_bounds(&compute_layout(&items, &config, 150., 10., 12., 1.), 12., 10.);
    assert!(zoomed.width() > rest.width());
}

#[test]
fn cursor_conversion_round_trips_rest_centers() {
    let items = items(5);
    let config = config(1.5, 3.);
    let main_size = 1000.;

    let rest = rest_bounds(&items, 48., 12., 10.);
    let offset = content_offset(main_size, rest);
    let layout = compute_layout(&items, &config, -1., 10., 12., 1.);

    // 窗口坐标下图标中心 → 内容坐标 → 应回到同一个中心
    for item in &layout {
        let window = item.center() + offset;
        let local = to_content_cursor(window, main_size, rest);
        assert_abs_diff_eq!(local, item.center(), epsilon = 1e-9);
    }

    assert_eq!(to_content_cursor(-1., main_size, rest), -1.);
}

#[test]
fn content_offset_centers() {
    let bounds = Bounds {
        left: -5.,
        right: 95.,
    };
    let offset = content_offset(300., bounds);
    assert_abs_diff_eq!(bounds.left + offset, 100.);
    assert_abs_diff_eq!(bounds.right + offset, 200.);
}

#[test]
fn hit_test_finds_items() {
    let layout = compute_layout(&items(3), &config(1.5, 3.), -1., 10., 12., 1.);
    assert_eq!(hit_test(&layout, 12., 10.), Some(0));
    assert_eq!(hit_test(&layout, 64., 10.), Some(0));
    assert_eq!(hit_test(&layout, 66., 10.), Some(1));
    assert_eq!(hit_test(&layout, 200., 10.), None);
    assert_eq!(hit_test(&layout, -1., 10.), None);
}

#[test]
fn icon_position_per_edge() {
    let (main, cross, pad, size, hide, bounce) = (100., 80., 8., 48., 10., 5.);

    assert_eq!(
        map_icon_position(Position::Bottom, main, cross, pad, size, hide, bounce),
        (100., 29.)
    );
    assert_eq!(
        map_icon_position(Position::Top, main, cross, pad, size, hide, bounce),
        (100., 3.)
    );
    assert_eq!(
        map_icon_position(Position::Left, main, cross, pad, size, hide, bounce),
        (3., 100.)
    );
    assert_eq!(
        map_icon_position(Position::Right, main, cross, pad, size, hide, bounce),
        (29., 100.)
    );
}

proptest! {
    #[test]
    fn scales_within_bounds(
        n in 1usize..12,
        cursor in -50f64..800.,
        zoom in 1f64..3.,
        progress in 0f64..=1.,
    ) {
        let layout = compute_layout(&items(n), &config(zoom, 3.), cursor, 6., 12., progress);
        prop_assert_eq!(layout.len(), n);
        for item in &layout {
            prop_assert!(item.scale >= 1. - 1e-9);
            prop_assert!(item.scale <= zoom + 1e-9);
        }
    }

    #[test]
    fn outside_cursor_is_rest(n in 1usize..12, cursor in -1000f64..-0.001) {
        let layout = compute_layout(&items(n), &config(1.5, 3.), cursor, 6., 12., 1.);
        for (i, item) in layout.iter().enumerate() {
            prop_assert_eq!(item.scale, 1.);
            prop_assert!((item.x - (12. + i as f64 * 54.)).abs() < 1e-9);
        }
    }

    #[test]
    fn symmetric_between_neighbours(n in 2usize..10, idx in 0usize..9) {
        let idx = idx % (n - 1);
        let centers: Vec<f64> = (0..n).map(|i| 12. + 24. + i as f64 * 54.).collect();
        let cursor = (centers[idx] + centers[idx + 1]) / 2.;

        let layout = compute_layout(&items(n), &config(1.5, 3.), cursor, 6., 12., 1.);
        prop_assert!((layout[idx].scale - layout[idx + 1].scale).abs() < 1e-9);
    }
}
