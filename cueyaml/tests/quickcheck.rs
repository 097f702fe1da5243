#[macro_use]
extern crate quickcheck;

use quickcheck::TestResult;

use cueyaml::ast::{Expr, LitKind, Op};
use cueyaml::{unmarshal, Decoder};

fn field_value(expr: &Expr, index: usize) -> &Expr {
    match expr {
        Expr::Struct(st) => &st.elts[index].value,
        other => panic!("expected a struct, got {other}"),
    }
}

quickcheck! {
    /// Every `0[0-7]+` literal decodes to the YAML 1.1 octal value.
    fn octal_round_trip(n: u32) -> bool {
        let oct = format!("{n:o}");
        let src = format!("x: 0{oct}\n");
        let expr = unmarshal("q.yaml", src.as_bytes()).unwrap();
        match field_value(&expr, 0) {
            Expr::BasicLit(lit) => {
                lit.kind == LitKind::Int
                    && lit.value == format!("0o{oct}")
                    && i64::from_str_radix(&oct, 8).unwrap() == i64::from(n)
            }
            _ => false,
        }
    }

    /// Decoding `-X` yields a unary minus around the positive literal `X`.
    fn negative_numbers_are_unary(n: u32, frac: bool) -> TestResult {
        if n == 0 {
            return TestResult::discard();
        }
        let body = if frac { format!("{n}.5") } else { n.to_string() };
        let src = format!("x: -{body}\n");
        let expr = unmarshal("q.yaml", src.as_bytes()).unwrap();
        let ok = match field_value(&expr, 0) {
            Expr::Unary(u) => {
                u.op == Op::Sub
                    && matches!(&*u.x, Expr::BasicLit(lit) if lit.value == body)
            }
            _ => false,
        };
        TestResult::from_bool(ok)
    }

    /// In `<<: [A, B]`, A's values win over B's for shared keys.
    fn merge_precedence(a: u16, b: u16) -> bool {
        let src = format!(
            "one: &one {{x: {a}}}\ntwo: &two {{x: {b}, y: 1}}\nout:\n  <<: [*one, *two]\n"
        );
        let expr = unmarshal("q.yaml", src.as_bytes()).unwrap();
        match field_value(&expr, 2) {
            Expr::Struct(st) => {
                let x = st.elts.iter().find(|f| f.label.text() == "x").unwrap();
                let y = st.elts.iter().find(|f| f.label.text() == "y").unwrap();
                x.value.to_string() == a.to_string() && y.value.to_string() == "1"
            }
            _ => false,
        }
    }

    /// Once the stream ends (or fails), the decoder repeats itself forever.
    fn decode_is_latched(src: String) -> bool {
        let mut decoder = Decoder::new("q.yaml", &src);
        let mut last = loop {
            match decoder.decode() {
                Ok(Some(_)) => {}
                other => break other,
            }
        };
        for _ in 0..3 {
            let next = decoder.decode();
            match (&last, &next) {
                (Ok(None), Ok(None)) => {}
                (Err(a), Err(b)) if a == b => {}
                _ => return false,
            }
            last = next;
        }
        true
    }

    /// Self-referential anchors error out instead of recursing forever.
    fn anchor_cycles_terminate(depth: u8) -> bool {
        let depth = usize::from(depth % 6) + 1;
        let mut src = String::from("a: &x\n");
        let mut indent = String::from("  ");
        for _ in 0..depth {
            src.push_str(&format!("{indent}n:\n"));
            indent.push_str("  ");
        }
        src.push_str(&format!("{indent}v: *x\n"));
        unmarshal("q.yaml", src.as_bytes()).is_err()
    }
}
