/// Data layer: core types, loading, cleaning and export.
///
/// Architecture:
/// ```text
///   .xlsx upload
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  first worksheet → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cleaner  │  columns (role config) → normalised Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  Table → .xlsx bytes
///   └──────────┘
/// ```

pub mod cleaner;
pub mod columns;
pub mod export;
pub mod loader;
pub mod model;
