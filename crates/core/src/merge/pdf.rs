//! [`DocumentBackend`] over `lopdf`.

use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use tracing::debug;

use super::{CompressionOptions, DocumentBackend};
use crate::error::MergeError;

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: &[&[u8]] = &[b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Bound on page-tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

/// A document being assembled, with its pages in final order.
///
/// The page tree and catalog are rebuilt on save, so appended pages keep no
/// ties to their source document's structure.
#[derive(Debug)]
pub struct PdfDocument {
	doc: Document,
	pages: Vec<ObjectId>,
}

impl PdfDocument {
	pub fn page_count(&self) -> usize {
		self.pages.len()
	}
}

impl DocumentBackend for LopdfBackend {
	type Document = PdfDocument;

	fn open_empty(&self) -> PdfDocument {
		PdfDocument {
			doc: Document::with_version("1.5"),
			pages: Vec::new(),
		}
	}

	fn open(&self, path: &Path) -> Result<PdfDocument, MergeError> {
		let doc = Document::load(path).map_err(|e| MergeError::UnreadableInput {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;
		let pages = doc.get_pages().into_values().collect();
		Ok(PdfDocument { doc, pages })
	}

	fn append_pages(&self, dest: &mut PdfDocument, src: PdfDocument) -> Result<(), MergeError> {
		let mut src = src.doc;
		src.renumber_objects_with(dest.doc.max_id + 1);

		let pages: Vec<ObjectId> = src.get_pages().into_values().collect();
		for &page in &pages {
			inherit_attributes(&mut src, page);
		}

		for (id, object) in src.objects {
			if is_document_structure(&object) {
				continue;
			}
			dest.doc.max_id = dest.doc.max_id.max(id.0);
			dest.doc.objects.insert(id, object);
		}
		dest.pages.extend(pages);
		Ok(())
	}

	fn page_count(&self, document: &PdfDocument) -> usize {
		document.page_count()
	}

	fn save(&self, document: PdfDocument, path: &Path, compression: &CompressionOptions) -> Result<(), MergeError> {
		let PdfDocument { mut doc, pages } = document;

		let pages_id = doc.new_object_id();
		for &page in &pages {
			if let Ok(dict) = doc.get_dictionary_mut(page) {
				dict.set("Parent", pages_id);
			}
		}
		let kids: Vec<Object> = pages.iter().map(|&id| Object::Reference(id)).collect();
		doc.objects.insert(
			pages_id,
			Object::Dictionary(dictionary! {
				"Type" => "Pages",
				"Kids" => kids,
				"Count" => pages.len() as i64,
			}),
		);
		let catalog_id = doc.add_object(dictionary! {
			"Type" => "Catalog",
			"Pages" => pages_id,
		});
		doc.trailer.set("Root", catalog_id);

		if compression.remove_unreferenced {
			let pruned = doc.prune_objects();
			debug!(target = "harvest", objects = pruned.len(), "removed unreferenced objects");
		}
		doc.renumber_objects();
		compress_streams(&mut doc, compression);

		write_atomically(&mut doc, path)
	}
}

fn write_atomically(doc: &mut Document, path: &Path) -> Result<(), MergeError> {
	let write_err = |reason: String| MergeError::Write {
		path: path.to_path_buf(),
		reason,
	};
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
	}

	let partial = partial_path(path);
	if let Err(err) = doc.save(&partial) {
		let _ = std::fs::remove_file(&partial);
		return Err(write_err(err.to_string()));
	}
	std::fs::rename(&partial, path).map_err(|e| {
		let _ = std::fs::remove_file(&partial);
		write_err(e.to_string())
	})
}

fn partial_path(path: &Path) -> PathBuf {
	let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(".partial");
	path.with_file_name(name)
}

/// Copies attributes the page inherits from its page-tree ancestors onto the
/// page itself, since those ancestors are dropped when the page is moved.
fn inherit_attributes(doc: &mut Document, page: ObjectId) {
	let Ok(dict) = doc.get_dictionary(page) else {
		return;
	};
	let mut missing: Vec<&[u8]> = INHERITABLE.iter().copied().filter(|key| !dict.has(key)).collect();
	let mut parent = dict.get(b"Parent").and_then(Object::as_reference).ok();
	let mut inherited = Vec::new();

	for _ in 0..MAX_TREE_DEPTH {
		let Some(id) = parent else { break };
		if missing.is_empty() {
			break;
		}
		let Ok(node) = doc.get_dictionary(id) else { break };
		missing.retain(|key| match node.get(key) {
			Ok(value) => {
				inherited.push((key.to_vec(), value.clone()));
				false
			}
			Err(_) => true,
		});
		parent = node.get(b"Parent").and_then(Object::as_reference).ok();
	}

	if let Ok(dict) = doc.get_dictionary_mut(page) {
		for (key, value) in inherited {
			dict.set(key, value);
		}
	}
}

fn is_document_structure(object: &Object) -> bool {
	let Object::Dictionary(dict) = object else {
		return false;
	};
	dict.get(b"Type")
		.and_then(Object::as_name)
		.is_ok_and(|name| matches!(name, b"Catalog" | b"Pages" | b"Outlines" | b"Outline"))
}

enum StreamKind {
	Image,
	Font,
	Other,
}

impl StreamKind {
	fn of(stream: &Stream) -> Self {
		let subtype = stream.dict.get(b"Subtype").and_then(Object::as_name).ok();
		match subtype {
			Some(b"Image") => StreamKind::Image,
			Some(b"Type1C" | b"CIDFontType0C" | b"OpenType") => StreamKind::Font,
			_ if [b"Length1", b"Length2", b"Length3"].iter().any(|k| stream.dict.has(*k)) => StreamKind::Font,
			_ => StreamKind::Other,
		}
	}
}

fn compress_streams(doc: &mut Document, options: &CompressionOptions) {
	for (id, object) in doc.objects.iter_mut() {
		let Object::Stream(stream) = object else {
			continue;
		};
		if !stream.allows_compression || stream.dict.has(b"Filter") {
			continue;
		}
		let enabled = match StreamKind::of(stream) {
			StreamKind::Image => options.compress_images,
			StreamKind::Font => options.compress_fonts,
			StreamKind::Other => options.compress_streams,
		};
		if !enabled {
			continue;
		}
		if let Err(err) = stream.compress() {
			debug!(target = "harvest", object = ?id, error = %err, "stream left uncompressed");
		}
	}
}
