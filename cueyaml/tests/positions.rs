//! Token positions: offsets, containment and relative-whitespace classes.

use cueyaml::ast::Expr;
use cueyaml::token::{Pos, RelPos};
use cueyaml::unmarshal;

fn un(src: &str) -> Expr {
    unmarshal("test.yaml", src.as_bytes()).expect("unmarshal failed")
}

fn fields(expr: &Expr) -> &[cueyaml::ast::Field] {
    match expr {
        Expr::Struct(st) => &st.elts,
        other => panic!("expected a struct, got {other}"),
    }
}

/// Collect every token position in emission order.
fn positions(expr: &Expr, out: &mut Vec<Pos>) {
    match expr {
        Expr::BasicLit(lit) => out.push(lit.pos),
        Expr::Ident(ident) => out.push(ident.pos),
        Expr::Unary(u) => {
            out.push(u.op_pos);
            positions(&u.x, out);
        }
        Expr::Binary(b) => {
            positions(&b.x, out);
            positions(&b.y, out);
        }
        Expr::Struct(st) => {
            out.push(st.lbrace);
            for f in &st.elts {
                out.push(f.label.pos());
                positions(&f.value, out);
            }
            out.push(st.rbrace);
        }
        Expr::List(l) => {
            out.push(l.lbrack);
            for e in &l.elts {
                positions(e, out);
            }
            out.push(l.rbrack);
        }
    }
}

fn assert_monotonic(src: &str) {
    let expr = un(src);
    let mut all = Vec::new();
    positions(&expr, &mut all);
    let offsets: Vec<usize> = all.iter().filter(|p| p.is_valid()).map(|p| p.offset).collect();
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted, "positions regressed for {src:?}");
}

#[test]
fn test_position_monotonicity() {
    assert_monotonic("a: 1\nb: 2\n");
    assert_monotonic("a:\n  b: 1\n  c: [1, 2]\nd: {x: y}\n");
    assert_monotonic("- 1\n- two\n- [3, 4]\n");
    assert_monotonic("a: |\n  text\nb: 2\n");
    assert_monotonic("a: 1\n\n\nb: 2\n");
}

#[test]
fn test_brace_containment() {
    fn check(expr: &Expr) {
        match expr {
            Expr::Struct(st) => {
                assert!(st.lbrace.offset <= st.rbrace.offset);
                for f in &st.elts {
                    check(&f.value);
                }
            }
            Expr::List(l) => {
                assert!(l.lbrack.offset <= l.rbrack.offset);
                for e in &l.elts {
                    check(e);
                }
            }
            _ => {}
        }
    }
    check(&un("a:\n  b: {x: 1}\n  c:\n    - [1]\n    - {}\n"));
}

#[test]
fn test_block_struct_relations() {
    let src = "a: 1\nb: 2\n";
    let expr = un(src);
    let Expr::Struct(st) = &expr else { panic!() };
    assert_eq!(st.lbrace.offset, 0);
    assert_eq!(st.lbrace.rel, RelPos::Blank);
    // The opening brace shares the first label's offset; the label still
    // starts its own line.
    assert_eq!(st.elts[0].label.pos().rel, RelPos::Newline);
    assert_eq!(st.elts[0].label.pos().offset, 0);
    match &st.elts[0].value {
        Expr::BasicLit(lit) => assert_eq!((lit.pos.offset, lit.pos.rel), (3, RelPos::Blank)),
        other => panic!("unexpected value {other}"),
    }
    assert_eq!(st.elts[1].label.pos().rel, RelPos::Newline);
    assert_eq!(st.elts[1].label.pos().offset, 5);
    // The closing brace sits at the end of the last line.
    assert_eq!(st.rbrace.offset, src.len() - 1);
    assert_eq!(st.rbrace.rel, RelPos::Newline);
}

#[test]
fn test_blank_line_marks_new_section() {
    let expr = un("a: 1\n\nb: 2\n");
    let Expr::Struct(st) = &expr else { panic!() };
    assert_eq!(st.elts[1].label.pos().rel, RelPos::NewSection);
}

#[test]
fn test_flow_struct_positions() {
    let src = "x: {a: 1}\n";
    let expr = un(src);
    match &fields(&expr)[0].value {
        Expr::Struct(st) => {
            assert_eq!(st.lbrace.offset, src.find('{').unwrap());
            assert_eq!(st.rbrace.offset, src.find('}').unwrap());
            assert_eq!(st.rbrace.rel, RelPos::Blank);
        }
        other => panic!("expected a struct, got {other}"),
    }
}

#[test]
fn test_empty_flow_collections() {
    let src = "x: {}\ny: []\n";
    let expr = un(src);
    let fields = fields(&expr);
    match &fields[0].value {
        Expr::Struct(st) => {
            assert_eq!(st.lbrace.offset, src.find('{').unwrap());
            assert_eq!(st.rbrace.offset, src.find('}').unwrap());
        }
        other => panic!("expected a struct, got {other}"),
    }
    match &fields[1].value {
        Expr::List(l) => {
            assert_eq!(l.lbrack.offset, src.find('[').unwrap());
            assert_eq!(l.rbrack.offset, src.find(']').unwrap());
        }
        other => panic!("expected a list, got {other}"),
    }
}

#[test]
fn test_alias_braces_rebase_to_use_site() {
    let src = "base: &b {a: 1}\nchild: *b\n";
    let expr = un(src);
    let star = src.find("*b").unwrap();
    match &fields(&expr)[1].value {
        Expr::Struct(st) => {
            assert_eq!(st.lbrace.offset, star);
            assert_eq!(st.lbrace.rel, RelPos::Blank);
            assert_eq!(st.rbrace.offset, star + "b".len());
            assert_eq!(st.rbrace.rel, RelPos::Blank);
        }
        other => panic!("expected a struct, got {other}"),
    }
}

#[test]
fn test_block_list_closes_on_own_line() {
    let expr = un("l:\n  - 1\n  - 2\n");
    match &fields(&expr)[0].value {
        Expr::List(l) => assert_eq!(l.rbrack.rel, RelPos::Newline),
        other => panic!("expected a list, got {other}"),
    }
}

#[test]
fn test_block_list_of_structs_closes_on_struct_line() {
    let expr = un("l:\n  - a: 1\n  - b: 2\n");
    match &fields(&expr)[0].value {
        Expr::List(l) => assert_eq!(l.rbrack.rel, RelPos::Blank),
        other => panic!("expected a list, got {other}"),
    }
}

#[test]
fn test_sibling_after_flow_close_gets_newline() {
    // The line-distance classification alone must put a sibling on its own
    // line after a flow collection closed the previous entry; nothing
    // forces the relation between container children.
    let expr = un("a: {x: 1}\nb: 2\n");
    let Expr::Struct(st) = &expr else { panic!() };
    assert_eq!(st.elts[1].label.pos().rel, RelPos::Newline);

    let expr = un("l:\n  - {a: 1}\n  - 2\n");
    match &fields(&expr)[0].value {
        Expr::List(l) => match &l.elts[1] {
            Expr::BasicLit(lit) => assert_eq!(lit.pos.rel, RelPos::Newline),
            other => panic!("expected a literal, got {other}"),
        },
        other => panic!("expected a list, got {other}"),
    }
}

#[test]
fn test_merged_fields_keep_anchor_site_positions() {
    let src = "base: &b {a: 1, b: 2}\nchild:\n  <<: *b\n  b: 3\n";
    let expr = un(src);
    match &fields(&expr)[1].value {
        Expr::Struct(st) => {
            let field = st.elts.iter().find(|f| f.label.text() == "a").unwrap();
            let label_pos = field.label.pos();
            assert!(label_pos.is_valid());
            assert_eq!(label_pos.offset, src.find("a: 1").unwrap());
            match &field.value {
                Expr::BasicLit(lit) => {
                    assert!(lit.pos.is_valid());
                    assert_eq!(lit.pos.offset, src.find("1,").unwrap());
                }
                other => panic!("expected a literal, got {other}"),
            }
        }
        other => panic!("expected a struct, got {other}"),
    }
}

#[test]
fn test_first_position_has_no_relation() {
    let expr = un("42\n");
    match &expr {
        Expr::BasicLit(lit) => assert_eq!(lit.pos.rel, RelPos::NoRel),
        other => panic!("expected a literal, got {other}"),
    }
}
