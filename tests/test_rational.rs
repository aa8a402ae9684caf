use showdown_solver::error::SpinError;
use showdown_solver::rational::Rational;

fn r(n: i128, d: i128) -> Rational {
    Rational::new(n, d).unwrap()
}

#[test]
fn test_identities() {
    for a in [r(3, 7), r(-5, 12), Rational::ZERO, r(40, 20), r(1, 128_000_000)] {
        assert_eq!(a, a);
        assert_eq!(a + Rational::ZERO, a);
        assert_eq!(a * Rational::ONE, a);
        assert_eq!(a - a, Rational::ZERO);
    }
}

#[test]
fn test_zero_denominator_is_rejected() {
    assert!(matches!(Rational::new(1, 0), Err(SpinError::ZeroDenominator)));
    assert!(matches!(Rational::new(0, 0), Err(SpinError::ZeroDenominator)));
}

#[test]
fn test_division_by_zero_fails() {
    let result = r(1, 2).checked_div(Rational::ZERO);
    assert!(matches!(result, Err(SpinError::DivisionByZero)));
}

#[test]
fn test_division() {
    assert_eq!(r(1, 2).checked_div(r(3, 4)).unwrap(), r(2, 3));
    assert_eq!(r(1, 2).checked_div(r(-1, 4)).unwrap(), Rational::from_integer(-2));
}

#[test]
fn test_canonical_sign() {
    let x = r(3, -9);
    assert_eq!(x.numerator(), -1);
    assert_eq!(x.denominator(), 3);
    assert_eq!(x, r(-1, 3));
}

#[test]
fn test_ordering_is_exact() {
    // 1/3 and 333333333/1000000000 differ only past nine decimal places.
    assert!(r(1, 3) > r(333_333_333, 1_000_000_000));
    assert!(r(-1, 2) < r(-1, 3));
    assert_eq!(r(2, 4).cmp(&r(1, 2)), std::cmp::Ordering::Equal);
    let mut values = vec![r(3, 4), r(-1, 5), r(1, 3), Rational::ZERO];
    values.sort();
    assert_eq!(values, vec![r(-1, 5), Rational::ZERO, r(1, 3), r(3, 4)]);
}

#[test]
fn test_display() {
    assert_eq!(r(6311, 20480).to_string(), "6311/20480");
    assert_eq!(Rational::from_integer(1).to_string(), "1");
    assert_eq!(r(-2, 4).to_string(), "-1/2");
}

#[test]
fn test_parse() {
    assert_eq!("3/4".parse::<Rational>().unwrap(), r(3, 4));
    assert_eq!(" 10 / -4 ".parse::<Rational>().unwrap(), r(-5, 2));
    assert_eq!("7".parse::<Rational>().unwrap(), Rational::from_integer(7));
    assert!("1/0".parse::<Rational>().is_err());
    assert!("a/b".parse::<Rational>().is_err());
    assert!("0.5".parse::<Rational>().is_err());
}

#[test]
fn test_json_uses_fraction_strings() {
    let json = serde_json::to_string(&r(42188819, 128000000)).unwrap();
    assert_eq!(json, "\"42188819/128000000\"");
    let back: Rational = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r(42188819, 128000000));
}

#[test]
fn test_repeated_folds_stay_reduced() {
    // Twenty uniform twentieths sum back to exactly one.
    let weight = Rational::unit_fraction(20);
    let total: Rational = (0..20).map(|_| weight).sum();
    assert!(total.is_one());
    assert_eq!(total.denominator(), 1);
}

#[test]
fn test_complement() {
    assert_eq!(r(1, 3).complement(), r(2, 3));
    assert_eq!(Rational::ONE.complement(), Rational::ZERO);
}
