use hexad_parse::{ArrayType, DataType, ScalarType, parse_scalar_or_array_type, parse_schema, render_schema};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = ScalarType> {
    proptest::sample::select(ScalarType::ALL.to_vec())
}

fn array_dims() -> impl Strategy<Value = Vec<u64>> {
    proptest::collection::vec(1u64..=3, 1..=8)
}

proptest! {
    #[test]
    fn rendered_scalar_parses_back(t in scalar()) {
        let parsed = parse_scalar_or_array_type(&DataType::scalar(t).to_string()).unwrap();
        prop_assert_eq!(parsed.dtype, DataType::scalar(t));
        prop_assert_eq!(parsed.fill, None);
    }

    #[test]
    fn rendered_array_parses_back(t in scalar(), dims in array_dims()) {
        let dtype = DataType::array(ArrayType::new(t, dims).unwrap());
        let parsed = parse_scalar_or_array_type(&dtype.to_string()).unwrap();
        prop_assert_eq!(parsed.dtype, dtype);
    }

    #[test]
    fn keywords_ignore_case(upper in any::<bool>()) {
        for kw in ScalarType::keywords() {
            let text = if upper { kw.to_ascii_uppercase() } else { kw.to_ascii_lowercase() };
            let parsed = parse_scalar_or_array_type(&text).unwrap();
            prop_assert_eq!(Some(parsed.dtype), ScalarType::from_keyword(kw).map(DataType::scalar));
        }
    }

    #[test]
    fn escaped_names_survive_render(names in proptest::collection::hash_set("[a-z ,]{1,8}", 1..6)) {
        let heading = names
            .iter()
            .map(|n| format!("{},int32", hexad_parse::escape(n)))
            .collect::<Vec<_>>()
            .join(",");
        let schema = parse_schema(&heading).unwrap();
        let mut expected: Vec<&String> = names.iter().collect();
        expected.sort();
        let mut got: Vec<&str> = schema.names().collect();
        got.sort();
        prop_assert_eq!(got, expected.iter().map(|s| s.as_str()).collect::<Vec<_>>());
        prop_assert_eq!(parse_schema(&render_schema(&schema)).unwrap(), schema);
    }
}
