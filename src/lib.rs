/*!
# Solution Dashboard

A password-gated web gateway for a shared solution-savings workbook, plus a
generator that turns the workbook into an Excel dashboard report.

## Overview

The solution list is a table of improvement solutions, one row per solution,
with the columns Division, Solution Name, Focus Area, Stage, SMV Unlock,
OH Reduction and Other Savings. Two programs work with it:

- **Gateway** (`website` binary): serves the dashboard page and its data,
  lets signed-in users download the canonical workbook and replace it by
  uploading a new `.xlsx` file.
- **Generator** (`create_dashboard`, `create_dynamic_dashboard` binaries):
  reads the workbook, aggregates savings by division, stage and focus area,
  ranks the divisions and writes a styled dashboard workbook with KPI cards,
  charts, a top performers table and key insights.

The two share no runtime state.

## Architecture

### Report generation
- **record**: Canonical columns and the `SolutionRecord` row type
- **loader**: Reads `.xlsx`/`.xls`/`.ods` (via calamine) or `.csv` input
- **summary**: Group-by aggregation, workbook totals and insights
- **ranking**: Division ranking with gold/silver/bronze tiers
- **formulas**: Formula text for the live variant
- **strategy**: `CellStrategy` with `BakedValues` and `LiveFormulas`
- **dashboard**: Workbook rendering with rust_xlsxwriter
- **generator**: Load, aggregate, render and save in one call
- **analytics**: Filters, the stage by focus area matrix and CSV export for the dashboard page

### Web gateway (feature `web`)
- **config**: `ServerConfig` from an optional JSON file plus `PORT`
- **login**: Argon2 credential store, session table and auth routes
- **storage**: The canonical workbook with atomic replace and gzip backup
- **app**: Routing, upload/download handlers and the static file route

## Routes

- `GET /login`, `POST /login`, `GET /logout` - Sign in and out
- `GET /check-auth` - Session status as JSON
- `GET /` - Dashboard page (requires a session)
- `GET /download-excel` - The canonical workbook (requires a session)
- `POST /upload-excel` - Replace the canonical workbook (requires a session)
- `GET /api/summary` - Filtered KPIs, ranking, insights and matrix as JSON (requires a session)
- `GET /api/export` - The filtered solutions as CSV (requires a session)
- `GET /{path}` - Allow-listed static files (requires a session)
*/

pub mod analytics;
pub mod dashboard;
pub mod error;
pub mod formulas;
pub mod generator;
pub mod loader;
pub mod ranking;
pub mod record;
pub mod saving;
pub mod strategy;
pub mod styles;
pub mod summary;

#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod login;
#[cfg(feature = "web")]
pub mod storage;

pub use dashboard::DashboardRenderer;
pub use error::ReportError;
pub use record::{Dimension, SavingsKind, SolutionRecord};
pub use strategy::{BakedValues, CellStrategy, LiveFormulas};
pub use summary::{Aggregates, DimensionSummary, Insights, Totals};

#[cfg(feature = "web")]
pub use config::ServerConfig;
#[cfg(feature = "web")]
pub use error::{ApiError, ConfigError};
