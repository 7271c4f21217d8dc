//! Extraction of the ranked holder table from the page HTML
//!
//! Only the first `<table>` is read. Header rows (no `<td>`) and rows with
//! fewer than three cells are skipped. Column layout:
//!
//! | 0      | 1                          | 2                         |
//! |--------|----------------------------|---------------------------|
//! | `1.`   | `34xp4v... wallet: Binance`| `248,597 BTC ($16.1B)`    |

use std::sync::LazyLock;

use holdwatch_core::snapshot::{Entry, Snapshot};
use holdwatch_core::units::parse_units;
use holdwatch_core::{Error, Result};
use regex::Regex;

static TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<table\b[^>]*>(.*?)</table>").expect("regex is valid"));
static ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<tr\b[^>]*>(.*?)</tr>").expect("regex is valid"));
static CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<t[dh]\b[^>]*>(.*?)</t[dh]>").expect("regex is valid"));
static DATA_CELL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<td\b").expect("regex is valid"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("regex is valid"));

/// Parse the first table of the page into a snapshot of at most `limit` rows
///
/// Balances are converted to smallest units with `decimals` fractional
/// digits. Ranks are taken from the page as-is; density is checked later by
/// the engine.
pub fn parse_holder_table(html: &str, limit: usize, decimals: u32) -> Result<Snapshot> {
    let table = TABLE
        .captures(html)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::malformed("holder table not found on page"))?;

    let mut entries = Vec::new();
    for row in ROW.captures_iter(table.as_str()) {
        if entries.len() >= limit {
            break;
        }

        let row = &row[1];
        if !DATA_CELL.is_match(row) {
            // header row
            continue;
        }

        let cells: Vec<String> = CELL
            .captures_iter(row)
            .map(|c| cell_text(&c[1]))
            .collect();
        if cells.len() < 3 {
            continue;
        }

        entries.push(parse_row(&cells, decimals)?);
    }

    tracing::debug!("Parsed {} holder rows", entries.len());
    Ok(Snapshot::new(entries))
}

fn parse_row(cells: &[String], decimals: u32) -> Result<Entry> {
    let rank_text = cells[0].replace(['.', '#'], "");
    let rank: u32 = rank_text
        .trim()
        .parse()
        .map_err(|_| Error::malformed(format!("unparseable rank {:?}", cells[0])))?;

    // "1P5Z... wallet: Binance" -> "1P5Z..."
    let address = cells[1]
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::malformed(format!("missing address at rank {}", rank)))?
        .to_string();

    let balance_text = cells[2].replace(',', "");
    let balance_sats = balance_text
        .split_whitespace()
        .next()
        .and_then(|amount| parse_units(amount, decimals))
        .ok_or_else(|| {
            Error::malformed(format!(
                "unparseable balance {:?} for {}",
                cells[2], address
            ))
        })?;

    Ok(Entry::new(rank, address, balance_sats))
}

/// Visible text of a cell with tags removed and whitespace collapsed
fn cell_text(inner: &str) -> String {
    let text = TAG.replace_all(inner, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#36;", "$");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<table id="tblOne" class="table table-striped abtb">
  <thead>
    <tr><th>#</th><th>Address</th><th>Balance</th><th>% of coins</th></tr>
  </thead>
  <tbody>
    <tr>
      <td>1</td>
      <td><a href="/bitcoin/address/34xp4vRoCGJym3xR7yCVPFHoCNxv4Twseo">34xp4vRoCGJym3xR7yCVPFHoCNxv4Twseo</a>
          <small><a href="/wallet/binance">wallet: Binance-coldwallet</a></small></td>
      <td>248,597 BTC ($16,141,543,312 USD)</td>
      <td>1.25%</td>
    </tr>
    <tr>
      <td>2.</td>
      <td><a>bc1qgdjqv0av3q56jvd82tkdjpy7gdp9ut8tlqmgrpmv24sq90ecnvqqjwvw97</a></td>
      <td>140,574.86451345&nbsp;BTC ($9,127,594,330 USD)</td>
      <td>0.71%</td>
    </tr>
    <tr><td colspan="4">ad</td></tr>
    <tr>
      <td>#3</td>
      <td>3LYJfcfHPXYJreMsASk2jkn69LWEYKzexb</td>
      <td>0.5 BTC</td>
      <td>0.00%</td>
    </tr>
  </tbody>
</table>
<table><tr><td>99</td><td>ignored</td><td>1 BTC</td></tr></table>
</body></html>
"#;

    #[test]
    fn test_parse_page() {
        let snapshot = parse_holder_table(PAGE, 100, 8).unwrap();
        let entries = snapshot.entries();

        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[0],
            Entry::new(1, "34xp4vRoCGJym3xR7yCVPFHoCNxv4Twseo", 24_859_700_000_000)
        );
        assert_eq!(
            entries[1],
            Entry::new(
                2,
                "bc1qgdjqv0av3q56jvd82tkdjpy7gdp9ut8tlqmgrpmv24sq90ecnvqqjwvw97",
                14_057_486_451_345
            )
        );
        assert_eq!(
            entries[2],
            Entry::new(3, "3LYJfcfHPXYJreMsASk2jkn69LWEYKzexb", 50_000_000)
        );
    }

    #[test]
    fn test_limit_caps_rows() {
        let snapshot = parse_holder_table(PAGE, 2, 8).unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn test_missing_table_is_malformed() {
        let err = parse_holder_table("<html><p>maintenance</p></html>", 100, 8).unwrap_err();
        assert_eq!(
            err.source_kind(),
            Some(holdwatch_core::SourceErrorKind::MalformedData)
        );
    }

    #[test]
    fn test_unparseable_balance_is_malformed() {
        let html = "<table><tr><td>1</td><td>addrA</td><td>n/a BTC</td></tr></table>";
        let err = parse_holder_table(html, 100, 8).unwrap_err();
        assert_eq!(
            err.source_kind(),
            Some(holdwatch_core::SourceErrorKind::MalformedData)
        );
    }

    #[test]
    fn test_unparseable_rank_is_malformed() {
        let html = "<table><tr><td>top</td><td>addrA</td><td>1 BTC</td></tr></table>";
        assert!(parse_holder_table(html, 100, 8).is_err());
    }

    #[test]
    fn test_cell_text_collapses_markup() {
        assert_eq!(
            cell_text("<a href='x'>addr</a>\n   <small>wallet:&nbsp;Foo &amp; Bar</small>"),
            "addr wallet: Foo & Bar"
        );
    }
}
