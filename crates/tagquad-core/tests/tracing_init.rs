#![cfg(feature = "tracing")]

use nalgebra::Point2;
use tagquad_core::{init_tracing, LinkParams, SegmentGraph};

#[test]
fn tracing_subscriber_installs_once() {
    init_tracing(false);
    // A second install is ignored rather than panicking.
    init_tracing(true);

    let mut graph = SegmentGraph::new();
    graph.push(Point2::new(0.0, 10.0), Point2::new(10.0, 10.0));
    graph.push(Point2::new(10.0, 10.0), Point2::new(10.0, 0.0));
    assert_eq!(graph.link_children(&LinkParams::default()), 1);
}
