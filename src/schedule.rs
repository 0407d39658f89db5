//! Corpus-wide scheduling of executable cases.
use crate::cases::{extract_cases, CaseId, CorpusError, TestCase};
use crate::corpus::AnnotatedFile;

/// Every case of the corpus, grouped per file in declaration order.
#[derive(Debug, Default)]
pub struct Schedule {
    pub cases: Vec<Vec<TestCase>>,
}

/// One unit of work for the execution engine.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: CaseId,
    pub name: String,
    /// File contents with the case's marker line removed.
    pub source: String,
}

impl Schedule {
    /// Extract all cases, applying `filter` as an extra name constraint.
    pub fn build(
        corpus: &[AnnotatedFile],
        recheck: bool,
        filter: Option<&str>,
    ) -> Result<Self, CorpusError> {
        let mut cases = Vec::with_capacity(corpus.len());
        for (index, file) in corpus.iter().enumerate() {
            let mut file_cases = extract_cases(index, file, recheck)?;
            if let Some(filter) = filter {
                for case in &mut file_cases {
                    case.execute &= case.name.contains(filter);
                }
            }
            cases.push(file_cases);
        }
        Ok(Self { cases })
    }

    pub fn executable(&self) -> impl Iterator<Item = &TestCase> {
        self.cases.iter().flatten().filter(|case| case.execute)
    }

    pub fn executable_count(&self) -> usize {
        self.executable().count()
    }

    /// Executable case count per file, in corpus order.
    pub fn per_file_counts(&self) -> Vec<usize> {
        self.cases
            .iter()
            .map(|file_cases| file_cases.iter().filter(|case| case.execute).count())
            .collect()
    }

    /// Flatten every executable case into a job, materializing its input.
    pub fn jobs(&self, corpus: &[AnnotatedFile]) -> Vec<Job> {
        self.executable()
            .map(|case| Job {
                id: case.id,
                name: case.name.clone(),
                source: corpus[case.id.file].text_without_line(case.marker_line),
            })
            .collect()
    }
}
