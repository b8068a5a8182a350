/// Destructure a proper list (`&Value`) against a fixed-length slice pattern,
/// or split a pair into head and tail. Yields `Result<_, RuntimeError>`;
/// the fixed-length form propagates an improper list with `?`.
#[macro_export]
macro_rules! match_list {
    // 匹配固定长度
    ($list:expr, [$($x:pat),*] => $expr:expr) => {{
        let items = $list.to_vec()?;
        match items.as_slice() {
            [$($x),*] => Ok($expr),
            _ => Err($crate::interpreter::ast_walk::RuntimeError::new(
                $crate::interpreter::ast_walk::RuntimeErrorKind::BadSyntax,
                format!("Expected list of length {}, got {}", <[&str]>::len(&[$(stringify!($x)),*]), items.len()),
            )),
        }
    }};

    // 匹配 head 和 tail
    ($list:expr, head: $x:ident, tail: $xs:ident => $expr:expr) => {
        match $list {
            $crate::interpreter::ast_walk::Value::Pair(pair) => {
                let ($x, $xs) = (&pair.first, &pair.rest);
                Ok($expr)
            }
            _ => Err($crate::interpreter::ast_walk::RuntimeError::new(
                $crate::interpreter::ast_walk::RuntimeErrorKind::BadSyntax,
                "Expected non-empty list",
            )),
        }
    };
}
