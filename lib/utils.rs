//! Output helpers.

/// Create a directory and all of its parents if it does not already exist,
/// evaluating to a [`PatternResult`][crate::PatternResult] of the path.
#[macro_export]
macro_rules! mkdir {
    ( $dir:expr ) => {
        {
            let dir: ::std::path::PathBuf = ::std::path::PathBuf::from($dir);
            match ::std::fs::create_dir_all(&dir) {
                Ok(()) => Ok::<_, $crate::PatternError>(dir),
                Err(err) => Err($crate::PatternError::from(err)),
            }
        }
    }
}

/// Write a collection of named arrays to a single `.npz` archive,
/// evaluating to a [`PatternResult<()>`][crate::PatternResult].
///
/// ```ignore
/// write_npz!(
///     outdir.join("pattern.npz"),
///     arrays: {
///         "phase" => &phase,
///         "x" => grid.x(),
///     }
/// )?;
/// ```
#[macro_export]
macro_rules! write_npz {
    (
        $filename:expr,
        arrays: { $( $key:expr => $arr:expr ),* $(,)? }
    ) => {
        {
            let write = || -> $crate::PatternResult<()> {
                let file = ::std::fs::File::create($filename)?;
                let mut npz = ::ndarray_npy::NpzWriter::new(file);
                $(
                    npz.add_array($key, $arr)?;
                )*
                npz.finish()?;
                Ok(())
            };
            write()
        }
    }
}
