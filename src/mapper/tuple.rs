//! Labeled tuples of arity 1 to 20

use super::decode::FromRowValue;
use super::errors::{MapperError, MapperResult};
use super::value::RowValue;

/// Largest tuple the mapper packs
pub const MAX_TUPLE_ARITY: usize = 20;

/// An ordered, labeled row of decoded values
///
/// Arity 0, arity above 20, or mismatched label/value counts produce the
/// empty tuple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tuple {
    labels: Vec<String>,
    values: Vec<RowValue>,
}

impl Tuple {
    /// Pack labels and values
    pub fn new(labels: Vec<String>, values: Vec<RowValue>) -> Self {
        if values.is_empty() || values.len() > MAX_TUPLE_ARITY || labels.len() != values.len() {
            return Self::empty();
        }
        Self { labels, values }
    }

    /// The empty tuple
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of values
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// True for the empty tuple
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Labels in order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Values in order
    pub fn values(&self) -> &[RowValue] {
        &self.values
    }

    /// Value at a position
    pub fn get(&self, index: usize) -> Option<&RowValue> {
        self.values.get(index)
    }

    /// Value under a label
    pub fn get_labeled(&self, label: &str) -> Option<&RowValue> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.values.get(i))
    }

    /// Convert into a native tuple, e.g. `(String, i64)`
    pub fn into_typed<T>(self) -> MapperResult<T>
    where
        T: TryFrom<Tuple, Error = MapperError>,
    {
        T::try_from(self)
    }

    /// Consume into the value vector
    pub fn into_values(self) -> Vec<RowValue> {
        self.values
    }
}

macro_rules! impl_tuple_conversion {
    ($len:expr => $($name:ident),+) => {
        impl<$($name: FromRowValue),+> TryFrom<Tuple> for ($($name,)+) {
            type Error = MapperError;

            fn try_from(tuple: Tuple) -> MapperResult<Self> {
                if tuple.arity() != $len {
                    return Err(MapperError::arity_mismatch($len, tuple.arity()));
                }
                let mut values = tuple.values.into_iter();
                Ok(($($name::from_row_value(values.next().unwrap_or(RowValue::Null))?,)+))
            }
        }
    };
}

impl_tuple_conversion!(1 => A);
impl_tuple_conversion!(2 => A, B);
impl_tuple_conversion!(3 => A, B, C);
impl_tuple_conversion!(4 => A, B, C, D);
impl_tuple_conversion!(5 => A, B, C, D, E);
impl_tuple_conversion!(6 => A, B, C, D, E, F);
impl_tuple_conversion!(7 => A, B, C, D, E, F, G);
impl_tuple_conversion!(8 => A, B, C, D, E, F, G, H);
impl_tuple_conversion!(9 => A, B, C, D, E, F, G, H, I);
impl_tuple_conversion!(10 => A, B, C, D, E, F, G, H, I, J);
impl_tuple_conversion!(11 => A, B, C, D, E, F, G, H, I, J, K);
impl_tuple_conversion!(12 => A, B, C, D, E, F, G, H, I, J, K, L);
impl_tuple_conversion!(13 => A, B, C, D, E, F, G, H, I, J, K, L, M);
impl_tuple_conversion!(14 => A, B, C, D, E, F, G, H, I, J, K, L, M, N);
impl_tuple_conversion!(15 => A, B, C, D, E, F, G, H, I, J, K, L, M, N, O);
impl_tuple_conversion!(16 => A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);
impl_tuple_conversion!(17 => A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q);
impl_tuple_conversion!(18 => A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R);
impl_tuple_conversion!(19 => A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S);
impl_tuple_conversion!(20 => A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T);

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_arity_zero_is_empty() {
        let tuple = Tuple::new(Vec::new(), Vec::new());
        assert!(tuple.is_empty());
        assert_eq!(tuple.arity(), 0);
    }

    #[test]
    fn test_arity_above_twenty_is_empty() {
        let names: Vec<String> = (0..21).map(|i| format!("f{}", i)).collect();
        let values = (0..21).map(RowValue::Int).collect();
        assert!(Tuple::new(names, values).is_empty());
    }

    #[test]
    fn test_arity_twenty_preserved() {
        let names: Vec<String> = (0..20).map(|i| format!("f{}", i)).collect();
        let values: Vec<RowValue> = (0..20).map(RowValue::Int).collect();
        let tuple = Tuple::new(names, values);
        assert_eq!(tuple.arity(), 20);
        assert_eq!(tuple.get(19), Some(&RowValue::Int(19)));
        assert_eq!(tuple.labels()[0], "f0");
    }

    #[test]
    fn test_labels_and_order_preserved() {
        let tuple = Tuple::new(
            labels(&["brand", "count"]),
            vec![RowValue::from("Nike"), RowValue::Int(4)],
        );
        assert_eq!(tuple.get_labeled("count"), Some(&RowValue::Int(4)));
        assert_eq!(tuple.values()[0], RowValue::from("Nike"));
    }

    #[test]
    fn test_into_native_tuple() {
        let tuple = Tuple::new(
            labels(&["brand", "count", "avg"]),
            vec![RowValue::from("Nike"), RowValue::Int(4), RowValue::Float(12.5)],
        );
        let (brand, count, avg): (String, i64, f64) = tuple.into_typed().unwrap();
        assert_eq!(brand, "Nike");
        assert_eq!(count, 4);
        assert_eq!(avg, 12.5);
    }

    #[test]
    fn test_arity_twenty_into_native_tuple() {
        let names: Vec<String> = (0..20).map(|i| format!("f{}", i)).collect();
        let mut values = vec![RowValue::from("first")];
        values.extend((1..19).map(RowValue::Int));
        values.push(RowValue::Float(19.5));
        let tuple = Tuple::new(names, values);

        #[allow(clippy::type_complexity)]
        let (a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r, s, t): (
            String, i64, i64, i64, i64, i64, i64, i64, i64, i64,
            i64, i64, i64, i64, i64, i64, i64, i64, i64, f64,
        ) = tuple.into_typed().unwrap();

        assert_eq!(a, "first");
        assert_eq!(
            [b, c, d, e, f, g, h, i, j, k, l, m, n, o, p, q, r, s],
            [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18]
        );
        assert_eq!(t, 19.5);
    }

    #[test]
    fn test_native_tuple_arity_mismatch() {
        let tuple = Tuple::new(labels(&["brand"]), vec![RowValue::from("Nike")]);
        let result: MapperResult<(String, i64)> = tuple.into_typed();
        assert_eq!(
            result.unwrap_err().code().code(),
            "SEARCH_MAPPER_ARITY_MISMATCH"
        );
    }
}
