//! Read model and FASTQ I/O shared by the front-ends
//!
//! Provides FASTQ parsing over memory-mapped or buffered input, transparent gzip
//! decompression, and FASTQ output. Newline search uses StringZilla.

use std::fs::File;
use std::io::{self, BufWriter, Read as IoRead, Write};

use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use stringzilla::sz::{find, find_byteset, Byteset};
use thiserror::Error;

/// Errors raised while opening or decoding input
#[derive(Error, Debug)]
pub enum InputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("cannot use {0} format - use gzip instead")]
    UnsupportedCompression(&'static str),
}

/// One basecalled read: name, sequence and per-base quality string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Read {
    pub name: Vec<u8>,
    pub sequence: Vec<u8>,
    pub quality: Vec<u8>,
}

impl Read {
    pub fn new(name: &[u8], sequence: &[u8], quality: &[u8]) -> Self {
        Self {
            name: name.to_vec(),
            sequence: sequence.to_vec(),
            quality: quality.to_vec(),
        }
    }

    /// Number of bases in the read
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// True when sequence and quality are both present and of equal length
    pub fn is_well_formed(&self) -> bool {
        !self.sequence.is_empty() && self.sequence.len() == self.quality.len()
    }

    /// Parse a complete FASTQ record stored as a single text value
    ///
    /// Records with fewer than four lines give an empty read rather than an error,
    /// so they are rejected later by the filters.
    pub fn from_embedded_fastq(record: &[u8]) -> Self {
        let mut lines = record.split(|&b| b == b'\n');
        match (lines.next(), lines.next(), lines.next(), lines.next()) {
            (Some(header), Some(sequence), Some(_), Some(quality)) => Self {
                name: read_name(header).to_vec(),
                sequence: sequence.trim_ascii().to_vec(),
                quality: quality.trim_ascii().to_vec(),
            },
            _ => Self::default(),
        }
    }
}

/// Name of a read from its header line: drop the leading `@`, stop at the first whitespace
fn read_name(header: &[u8]) -> &[u8] {
    let header = header.trim_ascii();
    let header = header.strip_prefix(b"@").unwrap_or(header);
    let whitespace = Byteset::from(b" \t\r\n");
    match find_byteset(header, whitespace) {
        Some(end) => &header[..end],
        None => header,
    }
}

/// Represents the input source - either a memory-mapped file or an owned buffer
pub enum InputSource {
    /// Memory-mapped file for zero-copy access
    MappedFile(Mmap),
    /// Stdin data or decompressed gzip data
    Buffer(Vec<u8>),
}

impl InputSource {
    /// Get the input data as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            InputSource::MappedFile(mmap) => &mmap[..],
            InputSource::Buffer(buf) => buf,
        }
    }

    /// Decompress gzip input; reject other compressed formats
    fn decompressed(self) -> Result<Self, InputError> {
        match detect_compression(self.as_bytes()) {
            Compression::Plain => Ok(self),
            Compression::Gzip => {
                let mut buffer = Vec::new();
                MultiGzDecoder::new(self.as_bytes()).read_to_end(&mut buffer)?;
                Ok(InputSource::Buffer(buffer))
            }
            Compression::Bzip2 => Err(InputError::UnsupportedCompression("bzip2")),
            Compression::Zip => Err(InputError::UnsupportedCompression("zip")),
        }
    }
}

/// Compression detected from the leading magic bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
    Bzip2,
    Zip,
}

/// Guess the compression of some data from its first few bytes
pub fn detect_compression(data: &[u8]) -> Compression {
    if data.starts_with(&[0x1f, 0x8b, 0x08]) {
        Compression::Gzip
    } else if data.starts_with(&[0x42, 0x5a, 0x68]) {
        Compression::Bzip2
    } else if data.starts_with(&[0x50, 0x4b, 0x03, 0x04]) {
        Compression::Zip
    } else {
        Compression::Plain
    }
}

/// Create an InputSource from either a file path or stdin, decompressing gzip
pub fn get_input(path: Option<&str>) -> Result<InputSource, InputError> {
    let source = match path {
        None | Some("-") => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            InputSource::Buffer(buffer)
        }
        Some(path) => {
            let file = File::open(path)?;
            // Empty files cannot be mapped on every platform
            if file.metadata()?.len() == 0 {
                InputSource::Buffer(Vec::new())
            } else {
                let mmap = unsafe { Mmap::map(&file)? };
                InputSource::MappedFile(mmap)
            }
        }
    };
    source.decompressed()
}

/// Create an output writer from either a file path or stdout
pub fn get_output(path: Option<&str>) -> io::Result<Box<dyn Write>> {
    match path {
        None | Some("-") => Ok(Box::new(BufWriter::new(io::stdout()))),
        Some(path) => {
            let file = File::create(path)?;
            Ok(Box::new(BufWriter::new(file)))
        }
    }
}

/// Write one read as a four-line FASTQ record
pub fn write_fastq(output: &mut impl Write, read: &Read) -> io::Result<()> {
    output.write_all(b"@")?;
    output.write_all(&read.name)?;
    output.write_all(b"\n")?;
    output.write_all(&read.sequence)?;
    output.write_all(b"\n+\n")?;
    output.write_all(&read.quality)?;
    output.write_all(b"\n")
}

/// Parse FASTQ records from input data
///
/// Lenient about layout: blank lines and anything before a `@` header line are
/// skipped, and every line is trimmed of surrounding whitespace. A record cut
/// short by the end of the data ends iteration.
pub struct FastqParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FastqParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Next line with surrounding whitespace removed, or None at end of data
    fn next_line(&mut self) -> Option<&'a [u8]> {
        if self.pos >= self.data.len() {
            return None;
        }
        let data = self.data;
        let remaining = &data[self.pos..];
        let line = match find(remaining, b"\n") {
            Some(i) => {
                self.pos += i + 1;
                &remaining[..i]
            }
            None => {
                self.pos = self.data.len();
                remaining
            }
        };
        Some(line.trim_ascii())
    }
}

impl<'a> Iterator for FastqParser<'a> {
    type Item = Read;

    fn next(&mut self) -> Option<Self::Item> {
        let header = loop {
            let line = self.next_line()?;
            if line.starts_with(b"@") {
                break line;
            }
        };

        let sequence = self.next_line()?;
        let _separator = self.next_line()?;
        let quality = self.next_line()?;

        Some(Read::new(read_name(header), sequence, quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fastq_parser_single_line() {
        let data = b"@seq1\nACGT\n+\nIIII\n@seq2\nTGCA\n+\nHHHH\n";
        let reads: Vec<_> = FastqParser::new(data).collect();

        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0], Read::new(b"seq1", b"ACGT", b"IIII"));
        assert_eq!(reads[1], Read::new(b"seq2", b"TGCA", b"HHHH"));
    }

    #[test]
    fn test_fastq_parser_name_stops_at_whitespace() {
        let data = b"@seq1 runid=abc ch=12\nACGT\n+seq1\nIIII\n";
        let reads: Vec<_> = FastqParser::new(data).collect();

        assert_eq!(reads.len(), 1);
        assert_eq!(reads[0].name, b"seq1");
    }

    #[test]
    fn test_fastq_parser_skips_junk_and_blank_lines() {
        let data = b"\n\njunk\n@seq1\r\nACGT\r\n+\r\nIIII\r\n\n@seq2\nAC\n+\n##";
        let reads: Vec<_> = FastqParser::new(data).collect();

        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0], Read::new(b"seq1", b"ACGT", b"IIII"));
        assert_eq!(reads[1], Read::new(b"seq2", b"AC", b"##"));
    }

    #[test]
    fn test_fastq_parser_truncated_record() {
        let data = b"@seq1\nACGT\n+\nIIII\n@seq2\nACGT\n";
        let reads: Vec<_> = FastqParser::new(data).collect();
        assert_eq!(reads.len(), 1);
    }

    #[test]
    fn test_embedded_fastq() {
        let read = Read::from_embedded_fastq(b"@abc_Basecall_1D_template\nACGT\n+\n#%&'\n");
        assert_eq!(read, Read::new(b"abc_Basecall_1D_template", b"ACGT", b"#%&'"));
        assert!(read.is_well_formed());
    }

    #[test]
    fn test_embedded_fastq_malformed() {
        let read = Read::from_embedded_fastq(b"@abc\nACGT\n");
        assert!(read.is_empty());
        assert!(!read.is_well_formed());
    }

    #[test]
    fn test_well_formed() {
        assert!(Read::new(b"a", b"ACGT", b"####").is_well_formed());
        assert!(!Read::new(b"a", b"ACGT", b"###").is_well_formed());
        assert!(!Read::new(b"a", b"", b"").is_well_formed());
    }

    #[test]
    fn test_detect_compression() {
        assert_eq!(detect_compression(b"@seq1\n"), Compression::Plain);
        assert_eq!(detect_compression(&[0x1f, 0x8b, 0x08, 0x00]), Compression::Gzip);
        assert_eq!(detect_compression(b"BZh91AY"), Compression::Bzip2);
        assert_eq!(detect_compression(&[0x50, 0x4b, 0x03, 0x04, 0x14]), Compression::Zip);
        assert_eq!(detect_compression(b""), Compression::Plain);
    }

    #[test]
    fn test_write_fastq() {
        let mut output = Vec::new();
        write_fastq(&mut output, &Read::new(b"seq1", b"ACGT", b"IIII")).unwrap();
        assert_eq!(output, b"@seq1\nACGT\n+\nIIII\n");
    }

    #[test]
    fn test_get_input_plain_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"@seq1\nACGT\n+\nIIII\n").unwrap();
        file.flush().unwrap();

        let input = get_input(file.path().to_str()).unwrap();
        let reads: Vec<_> = FastqParser::new(input.as_bytes()).collect();
        assert_eq!(reads, vec![Read::new(b"seq1", b"ACGT", b"IIII")]);
    }

    #[test]
    fn test_get_input_gzip_file() {
        let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(b"@seq1\nACGT\n+\nIIII\n@seq2\nAC\n+\n##\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&compressed).unwrap();
        file.flush().unwrap();

        let input = get_input(file.path().to_str()).unwrap();
        let reads: Vec<_> = FastqParser::new(input.as_bytes()).collect();
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[1], Read::new(b"seq2", b"AC", b"##"));
    }

    #[test]
    fn test_get_input_rejects_bzip2() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"BZh91AY&SY").unwrap();
        file.flush().unwrap();

        let err = get_input(file.path().to_str()).err().unwrap();
        assert!(matches!(err, InputError::UnsupportedCompression("bzip2")));
        assert!(err.to_string().contains("use gzip instead"));
    }

    #[test]
    fn test_get_input_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let input = get_input(file.path().to_str()).unwrap();
        assert!(input.as_bytes().is_empty());
    }
}
