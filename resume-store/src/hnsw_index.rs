use std::collections::HashMap;
use std::fs;
use std::path::Path;

use hnsw_rs::prelude::*;
use resume_model::ResumeId;

/// HNSW-based vector index (cosine distance). Persists by snapshotting
/// vectors + id map and rebuilding the graph on load.
pub struct HnswVectorIndex {
    dim: usize,
    hnsw: Hnsw<'static, f32, DistCosine>,
    /// resume id -> internal label
    id_map: HashMap<String, usize>,
    /// internal label -> resume id
    rev_map: Vec<String>,
    /// Stored vectors for persistence and rebuild
    vectors: Vec<Vec<f32>>,
}

impl HnswVectorIndex {
    pub fn new(dim: usize, expected: usize) -> Self {
        let max_nb_conn = 16;
        let ef_c = 200;
        let num_layers = 16;
        let hnsw = Hnsw::<f32, DistCosine>::new(max_nb_conn, expected, num_layers, ef_c, DistCosine {});
        Self { dim, hnsw, id_map: HashMap::new(), rev_map: Vec::new(), vectors: Vec::new() }
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.rev_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rev_map.is_empty()
    }

    /// Whether a snapshot exists under `dir`.
    pub fn snapshot_exists<P: AsRef<Path>>(dir: P) -> bool {
        dir.as_ref().join("map.tsv").exists()
    }

    /// Upsert a single vector. A duplicate id reuses its label and replaces
    /// the stored vector by reinsert (HNSW has no true delete); the newest
    /// vector wins in the snapshot and dominates lookups.
    pub fn upsert(&mut self, id: &ResumeId, vector: &[f32]) {
        if vector.len() != self.dim {
            return;
        }
        let label = if let Some(&lbl) = self.id_map.get(&id.0) {
            self.vectors[lbl] = vector.to_vec();
            lbl
        } else {
            let lbl = self.rev_map.len();
            self.id_map.insert(id.0.clone(), lbl);
            self.rev_map.push(id.0.clone());
            self.vectors.push(vector.to_vec());
            lbl
        };
        self.hnsw.insert((vector, label));
    }

    /// K nearest ids with similarity scores (1 - cosine distance), best
    /// first. Returns at most `k` hits.
    pub fn knn(&self, query: &[f32], k: usize) -> Vec<(ResumeId, f32)> {
        if query.len() != self.dim || k == 0 || self.rev_map.is_empty() {
            return Vec::new();
        }
        let ef_s = (k * 2).max(64);
        let knn = self.hnsw.search(query, k, ef_s);
        let mut out = Vec::with_capacity(knn.len());
        for el in knn {
            let label = el.d_id;
            let Some(id) = self.rev_map.get(label) else { continue };
            // cosine distance, smaller is better
            let score = 1.0f32 - el.distance;
            out.push((ResumeId(id.clone()), score));
            if out.len() >= k {
                break;
            }
        }
        out
    }

    /// Snapshot vectors + map to a directory (tmp files then rename).
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> std::io::Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let map_path = dir.join("map.tsv.tmp");
        let vec_path = dir.join("vectors.bin.tmp");
        {
            let mut w = fs::File::create(&map_path)?;
            for (i, id) in self.rev_map.iter().enumerate() {
                use std::io::Write;
                writeln!(w, "{i}\t{id}")?;
            }
        }
        {
            let mut w = fs::File::create(&vec_path)?;
            use std::io::Write;
            // binary: [u32 dim][f32..] repeated
            for v in &self.vectors {
                let dim = v.len() as u32;
                w.write_all(&dim.to_le_bytes())?;
                let bytes: &[u8] = bytemuck::cast_slice(&v[..]);
                w.write_all(bytes)?;
            }
        }
        fs::rename(map_path, dir.join("map.tsv"))?;
        fs::rename(vec_path, dir.join("vectors.bin"))?;
        Ok(())
    }

    /// Load a snapshot and rebuild the HNSW graph.
    pub fn load<P: AsRef<Path>>(dir: P, dim: usize) -> std::io::Result<Self> {
        let dir = dir.as_ref();
        let map_txt = fs::read_to_string(dir.join("map.tsv"))?;
        let mut rev_map: Vec<String> = Vec::new();
        for line in map_txt.lines() {
            let mut it = line.splitn(2, '\t');
            let _idx = it.next();
            if let Some(id) = it.next() {
                rev_map.push(id.to_string());
            }
        }
        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(rev_map.len());
        let mut r = std::io::BufReader::new(fs::File::open(dir.join("vectors.bin"))?);
        use std::io::Read;
        loop {
            let mut len_buf = [0u8; 4];
            if r.read_exact(&mut len_buf).is_err() {
                break;
            }
            let l = u32::from_le_bytes(len_buf) as usize;
            let mut vbytes = vec![0u8; 4 * l];
            r.read_exact(&mut vbytes)?;
            let vf32: Vec<f32> = bytemuck::cast_slice(&vbytes).to_vec();
            vectors.push(vf32);
        }
        let expected = vectors.len().max(1000);
        let hnsw = Hnsw::<f32, DistCosine>::new(16, expected, 16, 200, DistCosine {});
        let mut id_map = HashMap::new();
        for (i, v) in vectors.iter().enumerate() {
            id_map.insert(rev_map[i].clone(), i);
            hnsw.insert((&v[..], i));
        }
        Ok(Self { dim, hnsw, id_map, rev_map, vectors })
    }
}
