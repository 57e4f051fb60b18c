//! Whole-pipeline scenarios: IR graph → pointer analysis → value-flow graph
//! → abstract state → detectors.

use valueflow_ir::features::vfg::VfgEdgeKind;
use valueflow_ir::shared::ir::{Callee, GepOffset, IrGraph, ObjSize};
use valueflow_ir::{
    build_vfg, AbstractState, AnalysisOptions, BufOverflowDetector, IntervalValue,
    NullDerefDetector, PointerSolver, ViolationKind,
};

#[test]
fn addr_then_copy_produces_wired_vfg() {
    // p = &x; q = p
    let mut g = IrGraph::new(AnalysisOptions::default());
    let f = g.add_func("main", vec![], None, 0);
    let x = g.add_object("x", ObjSize::Bytes(8));
    let p = g.add_value_var("p");
    let q = g.add_value_var("q");
    let addr = g.add_addr(f, 0, p, x);
    let copy = g.add_copy(f, 1, q, p);

    let pta = PointerSolver::new().solve(&mut g).unwrap();
    assert!(pta.pts(q).contains(x));

    let vfg = build_vfg(&g, &pta).unwrap();
    let addr_node = vfg.node_of_stmt(addr).unwrap();
    let copy_node = vfg.node_of_stmt(copy).unwrap();

    assert_eq!(vfg.nodes_of_kind("addr").count(), 1);
    assert_eq!(vfg.nodes_of_kind("copy").count(), 1);
    assert!(vfg.has_edge(addr_node, copy_node, VfgEdgeKind::Direct));
}

#[test]
fn oversized_gep_offset_is_flagged() {
    // arr = alloc(10 bytes); p = gep arr, 12 — offset interval [12,12]
    let mut g = IrGraph::new(AnalysisOptions::default());
    let f = g.add_func("main", vec![], None, 0);
    let arr = g.add_object("arr", ObjSize::Bytes(10));
    let p = g.add_value_var("p");
    let d = g.add_value_var("d");
    g.add_addr(f, 0, p, arr);
    let gep = g.add_gep(f, 1, d, p, GepOffset::Const(12));
    g.set_source(gep, "demo.c:2");

    let pta = PointerSolver::new().solve(&mut g).unwrap();
    let state = AbstractState::from_pta(&g, &pta);

    let mut det = BufOverflowDetector::new();
    det.run(&g, &state);

    let report = det.into_report();
    assert_eq!(report.of_kind(ViolationKind::BufferOverflow).count(), 1);
    let v = report.iter().next().unwrap();
    assert_eq!(v.stmt, gep);
    assert!(v.source.contains("demo.c:2"));
}

#[test]
fn in_bounds_gep_interval_is_clean() {
    // Same layout, offset interval [0,9]: upper bound 9 < size 10
    let mut g = IrGraph::new(AnalysisOptions::default());
    let f = g.add_func("main", vec![], None, 0);
    let arr = g.add_object("arr", ObjSize::Bytes(10));
    let p = g.add_value_var("p");
    let i = g.add_value_var("i");
    let d = g.add_value_var("d");
    g.add_addr(f, 0, p, arr);
    g.add_gep(f, 1, d, p, GepOffset::Variant(i));

    let pta = PointerSolver::new().solve(&mut g).unwrap();
    let mut state = AbstractState::from_pta(&g, &pta);
    state.set_interval(i, IntervalValue::of(0, 9));

    let mut det = BufOverflowDetector::new();
    det.run(&g, &state);
    assert!(det.report().is_empty());
}

#[test]
fn memcpy_with_loose_length_is_flagged() {
    // memcpy(dst, src, n), n ∈ [0,20], dst is 16 bytes: ub(n-1)=19 >= 16
    let mut g = IrGraph::new(AnalysisOptions::default());
    let f = g.add_func("main", vec![], None, 0);
    let dsto = g.add_object("dstbuf", ObjSize::Bytes(16));
    let srco = g.add_object("srcbuf", ObjSize::Bytes(32));
    let dst = g.add_value_var("dst");
    let src = g.add_value_var("src");
    let n = g.add_value_var("n");
    g.add_addr(f, 0, dst, dsto);
    g.add_addr(f, 1, src, srco);
    g.add_call(f, 2, Callee::External("memcpy".into()), vec![dst, src, n], None);

    let pta = PointerSolver::new().solve(&mut g).unwrap();
    let mut state = AbstractState::from_pta(&g, &pta);
    state.set_interval(n, IntervalValue::of(0, 20));

    let mut det = BufOverflowDetector::new();
    det.run(&g, &state);
    assert_eq!(det.report().of_kind(ViolationKind::BufferOverflow).count(), 1);
}

#[test]
fn null_and_freed_dereferences_through_pipeline() {
    // p = &x; free(p); q = *p — and r is a null pointer dereference
    let mut g = IrGraph::new(AnalysisOptions::default());
    let f = g.add_func("main", vec![], None, 0);
    let x = g.add_object("x", ObjSize::Bytes(8));
    let p = g.add_value_var("p");
    let q = g.add_value_var("q");
    let r = g.add_value_var("r");
    let s = g.add_value_var("s");
    g.add_addr(f, 0, p, x);
    g.add_call(f, 1, Callee::External("free".into()), vec![p], None);
    g.add_load(f, 2, q, p);
    g.add_load(f, 3, s, r);

    let pta = PointerSolver::new().solve(&mut g).unwrap();
    let mut state = AbstractState::from_pta(&g, &pta);
    state.add_addr(r, valueflow_ir::shared::ir::NULL_OBJ);

    let mut det = NullDerefDetector::new();
    det.run(&g, &mut state);

    let report = det.into_report();
    assert_eq!(report.of_kind(ViolationKind::UseAfterFree).count(), 1);
    assert_eq!(report.of_kind(ViolationKind::NullDeref).count(), 1);
}

#[test]
fn report_renders_and_serializes() {
    let mut g = IrGraph::new(AnalysisOptions::default());
    let f = g.add_func("main", vec![], None, 0);
    let arr = g.add_object("arr", ObjSize::Bytes(4));
    let p = g.add_value_var("p");
    let d = g.add_value_var("d");
    g.add_addr(f, 0, p, arr);
    let gep = g.add_gep(f, 1, d, p, GepOffset::Const(8));
    g.set_source(gep, "demo.c:7");

    let pta = PointerSolver::new().solve(&mut g).unwrap();
    let state = AbstractState::from_pta(&g, &pta);

    let mut det = BufOverflowDetector::new();
    det.run(&g, &state);
    let report = det.into_report();

    let text = report.to_string();
    assert!(text.contains("buffer overflow"));
    assert!(text.contains("demo.c:7"));
    assert!(report.to_json().unwrap().contains("BufferOverflow"));
}
