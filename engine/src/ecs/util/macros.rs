/// Invoke `$m` once per suffix of the identifier list, longest first.
///
/// `for_each_arity!(m !! A, B, C)` expands to `m!(A, B, C); m!(B, C); m!(C);`.
#[macro_export]
macro_rules! for_each_arity {
    ($m:ident !! $head:ident) => {
        $m!($head);
    };
    ($m:ident !! $head:ident, $($tail:ident),*) => {
        $m!($head, $($tail),*);
        $crate::for_each_arity!($m !! $($tail),*);
    };
}

/// Apply a macro to every arity from 1 to 16.
///
/// Used for system functions (one identifier per parameter) and tuple bundles (one identifier per
/// component). Sixteen covers any system that should not be split up.
#[macro_export]
macro_rules! all_arities {
    ($m:ident) => {
        $crate::for_each_arity!($m !! A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P);
    };
}

#[cfg(test)]
mod tests {
    trait Arity {
        const ARITY: usize;
    }

    macro_rules! count_arity {
        ($($name:ident),*) => {
            impl<$($name),*> Arity for ($($name,)*) {
                const ARITY: usize = [$(stringify!($name)),*].len();
            }
        };
    }

    all_arities!(count_arity);

    #[test]
    fn covers_every_arity_up_to_sixteen() {
        // Then
        assert_eq!(<(u8,) as Arity>::ARITY, 1);
        assert_eq!(<(u8, u16) as Arity>::ARITY, 2);
        assert_eq!(
            <(u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8, u8) as Arity>::ARITY,
            16
        );
    }
}
