macro_rules! run_par {
    (
        $func:expr
    ) => {{
        #[cfg(feature = "std")]
        use rayon::prelude::*;

        #[cfg(feature = "std")]
        let output = rayon::scope(|_| $func());

        #[cfg(not(feature = "std"))]
        let output = $func();

        output
    }};
}

macro_rules! iter_par {
    (
        $items:expr
    ) => {{
        #[cfg(feature = "std")]
        let output = $items.into_par_iter();

        #[cfg(not(feature = "std"))]
        let output = $items.into_iter();

        output
    }};
}
