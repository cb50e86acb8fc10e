//! Number formatting and table ordering helpers.

use crate::api::Snapshot;

/// Regions ordered by cumulative cases, largest first.
/// Equal counts keep their input order. The input is left untouched.
pub fn sort_data(records: &[Snapshot]) -> Vec<Snapshot> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.cases.cmp(&a.cases));
    sorted
}

/// Count with thousands separators; absent or zero renders as "0".
pub fn pretty_print_stat(stat: Option<u64>) -> String {
    match stat {
        None | Some(0) => "0".to_string(),
        Some(n) => group_digits(n),
    }
}

/// Daily change with an explicit sign: "+1,234", "-3", "+0" when absent
pub fn pretty_print_delta(delta: Option<i64>) -> String {
    match delta.unwrap_or(0) {
        n if n < 0 => format!("-{}", group_digits(n.unsigned_abs())),
        n => format!("+{}", group_digits(n as u64)),
    }
}

/// Insert a comma every three digits from the right
pub fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Short form for axis labels and map annotations: 950, 1.2K, 3.4M, 1.1B
pub fn compact_stat(n: f64) -> String {
    let abs = n.abs();
    let sign = if n < 0.0 { "-" } else { "" };
    if abs >= 1e9 {
        format!("{sign}{:.1}B", abs / 1e9)
    } else if abs >= 1e6 {
        format!("{sign}{:.1}M", abs / 1e6)
    } else if abs >= 1e3 {
        format!("{sign}{:.1}K", abs / 1e3)
    } else {
        format!("{sign}{:.0}", abs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(name: &str, cases: u64) -> Snapshot {
        Snapshot {
            country: Some(name.to_string()),
            cases,
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_sort_descending() {
        let input = vec![region("a", 50), region("b", 200), region("c", 10)];
        let sorted = sort_data(&input);
        let cases: Vec<u64> = sorted.iter().map(|r| r.cases).collect();
        assert_eq!(cases, vec![200, 50, 10]);
    }

    #[test]
    fn test_sort_leaves_input_alone() {
        let input = vec![region("a", 1), region("b", 3), region("c", 2)];
        let before = input.clone();
        let _ = sort_data(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn test_sort_is_stable_permutation() {
        let input = vec![
            region("a", 5),
            region("b", 9),
            region("c", 5),
            region("d", 0),
            region("e", 9),
        ];
        let sorted = sort_data(&input);

        assert_eq!(sorted.len(), input.len());
        assert!(sorted.windows(2).all(|w| w[0].cases >= w[1].cases));

        let names: Vec<&str> = sorted.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["b", "e", "a", "c", "d"]);

        for record in &input {
            let count_in = input.iter().filter(|r| *r == record).count();
            let count_out = sorted.iter().filter(|r| *r == record).count();
            assert_eq!(count_in, count_out);
        }
    }

    #[test]
    fn test_sort_empty() {
        assert!(sort_data(&[]).is_empty());
    }

    #[test]
    fn test_pretty_print() {
        assert_eq!(pretty_print_stat(Some(0)), "0");
        assert_eq!(pretty_print_stat(None), "0");
        assert_eq!(pretty_print_stat(Some(7)), "7");
        assert_eq!(pretty_print_stat(Some(999)), "999");
        assert_eq!(pretty_print_stat(Some(1234)), "1,234");
        assert_eq!(pretty_print_stat(Some(1_000_000)), "1,000,000");
        assert_eq!(pretty_print_stat(Some(704_753_890)), "704,753,890");
    }

    #[test]
    fn test_pretty_print_delta() {
        assert_eq!(pretty_print_delta(None), "+0");
        assert_eq!(pretty_print_delta(Some(0)), "+0");
        assert_eq!(pretty_print_delta(Some(4_321)), "+4,321");
        assert_eq!(pretty_print_delta(Some(-3)), "-3");
        assert_eq!(pretty_print_delta(Some(-1_234_567)), "-1,234,567");
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact_stat(950.0), "950");
        assert_eq!(compact_stat(1_234.0), "1.2K");
        assert_eq!(compact_stat(3_400_000.0), "3.4M");
        assert_eq!(compact_stat(1_100_000_000.0), "1.1B");
        assert_eq!(compact_stat(-2_500.0), "-2.5K");
    }
}
