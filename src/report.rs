use std::io::Write;

use anyhow::Result;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::PrettyFormatter;

use crate::s3::{BucketUploads, UploadRecord};

/// Bucket name to uploads, in first-seen order. A repeated bucket keeps its
/// position but takes the uploads of its last occurrence.
struct Collected<'a>(Vec<(&'a str, &'a [UploadRecord])>);

impl<'a> Collected<'a> {
    fn new(results: &'a [BucketUploads]) -> Self {
        let mut entries: Vec<(&str, &[UploadRecord])> = Vec::with_capacity(results.len());

        for result in results {
            match entries.iter_mut().find(|(bucket, _)| *bucket == result.bucket) {
                Some(entry) => entry.1 = result.uploads.as_slice(),
                None => entries.push((result.bucket.as_str(), result.uploads.as_slice())),
            }
        }

        Collected(entries)
    }
}

impl Serialize for Collected<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (bucket, uploads) in &self.0 {
            map.serialize_entry(bucket, uploads)?;
        }
        map.end()
    }
}

pub fn render(results: &[BucketUploads]) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    Collected::new(results).serialize(&mut ser)?;

    let mut out = String::from_utf8(buf)?;
    out.push('\n');

    Ok(out)
}

pub fn print_uploads<W: Write>(results: &[BucketUploads], out: &mut W) -> Result<()> {
    writeln!(out, "{}", render(results)?)?;

    Ok(())
}
