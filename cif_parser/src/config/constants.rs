pub mod compile_time {
    pub mod file_processing {
        /// Maximum input size accepted for parsing (1GB)
        /// RESOURCE: Whole-file reads are buffered in memory before tokenizing
        pub const MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;

        /// Threshold for considering a file "large" (16MB)
        /// PERFORMANCE: Large files get extra timing detail in the success log
        pub const LARGE_FILE_THRESHOLD: u64 = 16 * 1024 * 1024;

        /// Extensions recognized as CIF-formatted input
        pub const CIF_EXTENSIONS: &[&str] = &["cif", "mmcif", "dic", "ddl"];
    }

    pub mod lexical {
        /// Maximum length of a single unquoted, quoted or item-name token
        /// SECURITY: Bounds memory retained for one token payload
        pub const MAX_TOKEN_LENGTH: usize = 1_048_576;

        /// Characters that may close a quoted value when they follow the quote
        pub const QUOTE_TERMINATORS: &[char] = &[' ', '\t', '\r', '\n'];
    }

    pub mod logging {
        /// Maximum diagnostics kept per parse before truncation
        /// RESOURCE: Prevents unbounded diagnostic accumulation
        pub const MAX_DIAGNOSTICS: usize = 10_000;

        /// Log buffer size for the in-memory sink
        /// RESOURCE: Controls memory usage for logging
        pub const LOG_BUFFER_SIZE: usize = 10_000;

        /// Maximum log message length
        /// RESOURCE: Prevents memory attacks via huge messages
        pub const MAX_LOG_MESSAGE_LENGTH: usize = 10_000;
    }

    pub mod container {
        /// Block name assigned when a data block header carries no name
        pub const UNNAMED_BLOCK_NAME: &str = "UNNAMED";

        /// Separator between a block name and its de-duplication counter
        pub const DUPLICATE_BLOCK_SEPARATOR: char = '#';
    }

    pub mod dictionary {
        /// Block name used before the first data block header is seen
        pub const DEFAULT_BLOCK_NAME: &str = "MISSING_DIC";

        /// Prefix for generated names of empty dictionary data blocks
        pub const UNNAMED_BLOCK_PREFIX: &str = "UNNAMED";

        /// DDL mandatory code marking an item whose value is derived
        pub const IMPLICIT: &str = "implicit";

        /// DDL mandatory code marking an item numbered 1..N per table
        pub const IMPLICIT_ORDINAL: &str = "implicit-ordinal";

        /// DDL tables consulted by the dictionary parser
        pub const CATEGORY_TABLE: &str = "category";
        pub const ITEM_TABLE: &str = "item";
        pub const PDBX_ITEM_TABLE: &str = "pdbx_item";

        /// Categories whose implicit value is the data block name
        pub const BLOCK_SCOPED_CATEGORIES: &[&str] = &["dictionary"];

        /// Format registry table and columns
        pub const FORMAT_TABLE: &str = "format";
        pub const FORMAT_BLOCK_COLUMN: &str = "dbName";
        pub const FORMAT_TYPE_COLUMN: &str = "type";
        pub const FORMAT_CATEGORY_COLUMN: &str = "catName";
    }
}
