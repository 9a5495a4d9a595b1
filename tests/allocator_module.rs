use passbook::allocator::{
    compose_semester_code, compose_static_code, FormatError, SequenceCode, SequenceError,
};

fn code(raw: &str) -> SequenceCode {
    SequenceCode::parse(raw).expect("valid code")
}

#[test]
fn walking_the_sequence_crosses_counter_and_prefix_boundaries() {
    let mut current = code("AY98");
    let mut seen = Vec::new();
    for _ in 0..4 {
        current = current.next();
        seen.push(current.to_string());
    }
    assert_eq!(seen, ["AY99", "AZ01", "AZ02", "AZ03"]);
    assert_eq!(code("AZ99").next().to_string(), "BA01");
    assert_eq!(code("ZZ99").next().to_string(), "AAA01");
    assert_eq!(code("AZZ99").next().to_string(), "BAA01");
    assert_eq!(code("ZZZ99").next().to_string(), "AAAA01");
}

#[test]
fn ordering_ranks_wider_prefixes_after_narrower_ones() {
    let mut codes = vec![code("AAA01"), code("ZZ99"), code("AB01"), code("AA99")];
    codes.sort();
    let rendered: Vec<String> = codes.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, ["AA99", "AB01", "ZZ99", "AAA01"]);
}

#[test]
fn malformed_codes_are_rejected() {
    for raw in ["", "AA", "AA1", "aa01", "AA00", "A-01", "AA100", "01"] {
        assert!(
            matches!(SequenceCode::parse(raw), Err(SequenceError::Malformed { .. })),
            "`{raw}` should be rejected"
        );
    }
}

#[test]
fn semester_code_is_built_from_static_code() {
    let static_code = compose_static_code("BAGC", &code("AA01"));
    assert_eq!(static_code, "BAGC-AA01");
    assert_eq!(
        compose_semester_code(&static_code, "S1").expect("compose"),
        "BAGC-S1-AA01"
    );
    assert!(matches!(
        compose_semester_code("BAGCAA01", "S1"),
        Err(FormatError::StaticCodeShape { .. })
    ));
}
