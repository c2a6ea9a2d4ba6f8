//! Plain-text inputs and outputs used by the command-line tool.

use std::collections::HashMap;
use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};

use super::{
    Allele, Base, Locus, Pileup, PileupElement, ReadObservation, SiteCall, SiteInput, TruthAlleles,
    TruthSource,
};

/// Read per-observation pileup rows and group consecutive rows of the same
/// locus into sites.
///
/// Columns (tab or space separated):
/// `sample chrom pos ref read_name read_start base qual [mapq [strand]]`.
/// Blank lines and lines starting with `#` are skipped.
pub fn read_sites<R: BufRead>(reader: R) -> Result<Vec<SiteInput>> {
    let mut sites: Vec<SiteInput> = Vec::new();
    let mut pending: HashMap<String, Vec<PileupElement>> = HashMap::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let row = parse_row(trimmed).with_context(|| format!("invalid pileup row on line {}", line_no + 1))?;

        let same_site = sites
            .last()
            .map(|site| site.locus == row.locus)
            .unwrap_or(false);
        if !same_site {
            flush_samples(sites.last_mut(), &mut pending);
            sites.push(SiteInput::new(row.locus.clone(), row.reference));
        } else if let Some(site) = sites.last() {
            if site.reference != row.reference {
                bail!(
                    "line {}: reference '{}' conflicts with '{}' at {}",
                    line_no + 1,
                    row.reference as char,
                    site.reference as char,
                    row.locus
                );
            }
        }
        pending.entry(row.sample).or_default().push(row.element);
    }
    flush_samples(sites.last_mut(), &mut pending);

    Ok(sites)
}

struct PileupRow {
    sample: String,
    locus: Locus,
    reference: u8,
    element: PileupElement,
}

fn parse_row(line: &str) -> Result<PileupRow> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        bail!("expected at least 8 columns, found {}", fields.len());
    }

    let position: u32 = fields[2]
        .parse()
        .with_context(|| format!("invalid position '{}'", fields[2]))?;
    let reference = single_symbol(fields[3]).context("reference must be a single symbol")?;
    let read_start: u32 = fields[5]
        .parse()
        .with_context(|| format!("invalid read start '{}'", fields[5]))?;
    let base = single_symbol(fields[6]).context("observed base must be a single symbol")?;
    let quality: u8 = fields[7]
        .parse()
        .with_context(|| format!("invalid base quality '{}'", fields[7]))?;

    let mut observation = ReadObservation::new(fields[4], read_start, base, quality)
        .with_read_offset(position.saturating_sub(read_start) as usize);
    if let Some(mapq) = fields.get(8) {
        let mapq: u8 = mapq
            .parse()
            .with_context(|| format!("invalid mapping quality '{mapq}'"))?;
        observation = observation.with_mapping_quality(mapq);
    }
    if let Some(strand) = fields.get(9) {
        let is_reverse = match *strand {
            "+" => false,
            "-" => true,
            other => bail!("invalid strand '{other}'"),
        };
        observation = observation.with_reverse_strand(is_reverse);
    }

    Ok(PileupRow {
        sample: fields[0].to_string(),
        locus: Locus::new(fields[1], position),
        reference,
        element: observation.into(),
    })
}

fn single_symbol(field: &str) -> Result<u8> {
    match field.as_bytes() {
        [symbol] => Ok(*symbol),
        _ => Err(anyhow!("expected one symbol, found '{field}'")),
    }
}

fn flush_samples(site: Option<&mut SiteInput>, pending: &mut HashMap<String, Vec<PileupElement>>) {
    if let Some(site) = site {
        for (sample, elements) in pending.drain() {
            site.samples.insert(sample, Pileup::new(elements));
        }
    }
}

/// Truth source backed by an in-memory map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTruthSource {
    records: HashMap<Locus, TruthAlleles>,
}

impl InMemoryTruthSource {
    /// Empty truth set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record alleles for a locus, replacing any earlier record.
    pub fn insert(&mut self, locus: Locus, alleles: TruthAlleles) {
        self.records.insert(locus, alleles);
    }

    /// Number of loci with a record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no loci are recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load `chrom pos ref alt[,alt...]` rows.
    pub fn read<R: BufRead>(reader: R) -> Result<Self> {
        let mut source = Self::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            if fields.len() < 4 {
                bail!("line {}: expected 4 columns, found {}", line_no + 1, fields.len());
            }
            let position: u32 = fields[1]
                .parse()
                .with_context(|| format!("line {}: invalid position '{}'", line_no + 1, fields[1]))?;
            let alternates = fields[3]
                .split(',')
                .map(|alt| alt.as_bytes().to_vec())
                .collect();
            source.insert(
                Locus::new(fields[0], position),
                TruthAlleles::new(fields[2].as_bytes().to_vec(), alternates),
            );
        }
        Ok(source)
    }
}

impl TruthSource for InMemoryTruthSource {
    fn fetch_truth_alleles(&self, locus: &Locus) -> Option<TruthAlleles> {
        self.records.get(locus).cloned()
    }
}

/// Parse a comma-separated allele list such as `A,G,T`; the first entry is
/// the reference slot.
pub fn parse_allele_list(list: &str) -> Result<Vec<Allele>> {
    list.split(',')
        .enumerate()
        .map(|(idx, symbol)| -> Result<Allele> {
            let base = single_symbol(symbol.trim())
                .ok()
                .and_then(Base::from_ascii)
                .ok_or_else(|| anyhow!("'{symbol}' is not one of A, C, G, T"))?;
            Ok(if idx == 0 {
                Allele::reference(base)
            } else {
                Allele::alternate(base)
            })
        })
        .collect()
}

/// Write one tab-delimited line per call:
/// `chrom pos ref alts sample:PL:DP ...`, with `.` for no alternates.
pub fn write_calls<W: Write>(writer: &mut W, calls: &[SiteCall]) -> Result<()> {
    for call in calls {
        writeln!(writer, "{}", format_call(call))?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a single call line.
pub fn format_call(call: &SiteCall) -> String {
    let alternates = if call.is_variant() {
        call.alleles
            .alternates()
            .iter()
            .map(|allele| allele.base().to_string())
            .collect::<Vec<_>>()
            .join(",")
    } else {
        ".".to_string()
    };

    let mut fields = vec![
        call.locus.contig.to_string(),
        call.locus.position.to_string(),
        call.alleles.reference().base().to_string(),
        alternates,
    ];
    fields.extend(call.samples.iter().map(|record| {
        let pls = record
            .phred_likelihoods()
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}:{}:{}", record.sample, pls, record.depth)
    }));
    fields.join("\t")
}
