//! Builders assembling synthetic binary documents and resource tables for
//! the integration tests. No binary fixtures are checked in; every test
//! constructs exactly the chunk stream it needs.

pub const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

pub const TYPE_STRING: u8 = 0x03;
pub const TYPE_INT_DEC: u8 = 0x10;
pub const TYPE_INT_HEX: u8 = 0x11;
pub const TYPE_REFERENCE: u8 = 0x01;

fn push_u16(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn push_i32(out: &mut Vec<u8>, v: i32) {
    out.extend_from_slice(&v.to_le_bytes());
}

/// Serializes a UTF-16 string pool chunk.
fn string_pool_chunk(strings: &[String]) -> Vec<u8> {
    let mut data = Vec::new();
    let mut offsets = Vec::new();
    for s in strings {
        offsets.push(data.len() as u32);
        let units: Vec<u16> = s.encode_utf16().collect();
        push_u16(&mut data, units.len() as u16);
        for u in units {
            push_u16(&mut data, u);
        }
        push_u16(&mut data, 0);
    }

    let strings_start = 28 + 4 * offsets.len() as u32;
    let mut chunk = Vec::new();
    push_u16(&mut chunk, 0x0001);
    push_u16(&mut chunk, 28);
    push_u32(&mut chunk, strings_start + data.len() as u32);
    push_u32(&mut chunk, offsets.len() as u32);
    push_u32(&mut chunk, 0); // style_count
    push_u32(&mut chunk, 0); // flags: UTF-16
    push_u32(&mut chunk, strings_start);
    push_u32(&mut chunk, 0); // styles_start
    for o in &offsets {
        push_u32(&mut chunk, *o);
    }
    chunk.extend_from_slice(&data);
    chunk
}

/// An attribute record with already-interned string references.
#[derive(Clone, Copy)]
pub struct Attr {
    pub ns_ref: i32,
    pub name_ref: u32,
    pub raw_ref: i32,
    pub data_type: u8,
    pub data: u32,
}

/// Assembles a compiled XML document chunk by chunk.
#[derive(Default)]
pub struct AxmlBuilder {
    strings: Vec<String>,
    resource_ids: Vec<u32>,
    chunks: Vec<Vec<u8>>,
}

impl AxmlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns a plain string, reusing an existing index when possible.
    pub fn intern(&mut self, s: &str) -> u32 {
        if let Some(i) = self.strings.iter().position(|x| x == s) {
            return i as u32;
        }
        self.strings.push(s.to_owned());
        self.strings.len() as u32 - 1
    }

    /// Appends a string covered by the resource map. Mapped strings must
    /// come first in the pool, before any plain interning.
    pub fn intern_with_id(&mut self, s: &str, res_id: u32) -> u32 {
        assert_eq!(
            self.strings.len(),
            self.resource_ids.len(),
            "mapped strings must be added before plain strings"
        );
        self.strings.push(s.to_owned());
        self.resource_ids.push(res_id);
        self.strings.len() as u32 - 1
    }

    pub fn attr(
        &mut self,
        ns: Option<&str>,
        name: &str,
        raw: Option<&str>,
        data_type: u8,
        data: u32,
    ) -> Attr {
        Attr {
            ns_ref: ns.map(|u| self.intern(u) as i32).unwrap_or(-1),
            name_ref: self.intern(name),
            raw_ref: raw.map(|r| self.intern(r) as i32).unwrap_or(-1),
            data_type,
            data,
        }
    }

    pub fn attr_by_ref(&self, name_ref: u32, data_type: u8, data: u32) -> Attr {
        Attr {
            ns_ref: -1,
            name_ref,
            raw_ref: -1,
            data_type,
            data,
        }
    }

    /// A raw-string attribute: the typed value mirrors the string the way
    /// aapt writes it.
    pub fn raw_attr(&mut self, ns: Option<&str>, name: &str, value: &str) -> Attr {
        let raw_ref = self.intern(value);
        Attr {
            ns_ref: ns.map(|u| self.intern(u) as i32).unwrap_or(-1),
            name_ref: self.intern(name),
            raw_ref: raw_ref as i32,
            data_type: TYPE_STRING,
            data: raw_ref,
        }
    }

    fn node_chunk(&mut self, chunk_type: u16, body: Vec<u8>) {
        let mut chunk = Vec::new();
        push_u16(&mut chunk, chunk_type);
        push_u16(&mut chunk, 16);
        push_u32(&mut chunk, 16 + body.len() as u32);
        push_u32(&mut chunk, 1); // line
        push_i32(&mut chunk, -1); // comment
        chunk.extend_from_slice(&body);
        self.chunks.push(chunk);
    }

    pub fn start_namespace(&mut self, prefix: &str, uri: &str) {
        let prefix_ref = self.intern(prefix);
        let uri_ref = self.intern(uri);
        let mut body = Vec::new();
        push_u32(&mut body, prefix_ref);
        push_u32(&mut body, uri_ref);
        self.node_chunk(0x0100, body);
    }

    pub fn end_namespace(&mut self, prefix: &str, uri: &str) {
        let prefix_ref = self.intern(prefix);
        let uri_ref = self.intern(uri);
        let mut body = Vec::new();
        push_u32(&mut body, prefix_ref);
        push_u32(&mut body, uri_ref);
        self.node_chunk(0x0101, body);
    }

    pub fn start_element(&mut self, ns: Option<&str>, name: &str, attrs: &[Attr]) {
        self.start_element_with_stride(ns, name, attrs, 20);
    }

    /// Start tag with an explicit attribute record stride; records larger
    /// than their fields are padded with zeros.
    pub fn start_element_with_stride(
        &mut self,
        ns: Option<&str>,
        name: &str,
        attrs: &[Attr],
        stride: u16,
    ) {
        let ns_ref = ns.map(|u| self.intern(u) as i32).unwrap_or(-1);
        let name_ref = self.intern(name);

        let mut body = Vec::new();
        push_i32(&mut body, ns_ref);
        push_u32(&mut body, name_ref);
        push_u16(&mut body, 20); // attribute_start
        push_u16(&mut body, stride); // attribute_size
        push_u16(&mut body, attrs.len() as u16);
        push_u16(&mut body, 0); // id_index
        push_u16(&mut body, 0); // class_index
        push_u16(&mut body, 0); // style_index

        for attr in attrs {
            let record_start = body.len();
            push_i32(&mut body, attr.ns_ref);
            push_u32(&mut body, attr.name_ref);
            push_i32(&mut body, attr.raw_ref);
            push_u16(&mut body, 8); // value size
            body.push(0); // res0
            body.push(attr.data_type);
            push_u32(&mut body, attr.data);
            while body.len() < record_start + stride as usize {
                body.push(0);
            }
        }

        self.node_chunk(0x0102, body);
    }

    pub fn end_element(&mut self, ns: Option<&str>, name: &str) {
        let ns_ref = ns.map(|u| self.intern(u) as i32).unwrap_or(-1);
        let name_ref = self.intern(name);
        let mut body = Vec::new();
        push_i32(&mut body, ns_ref);
        push_u32(&mut body, name_ref);
        self.node_chunk(0x0103, body);
    }

    pub fn cdata(&mut self, text: &str) {
        let data_ref = self.intern(text);
        let mut body = Vec::new();
        push_u32(&mut body, data_ref);
        push_u16(&mut body, 8);
        body.push(0);
        body.push(TYPE_STRING);
        push_u32(&mut body, data_ref);
        self.node_chunk(0x0104, body);
    }

    pub fn build(self) -> Vec<u8> {
        let mut body = string_pool_chunk(&self.strings);

        if !self.resource_ids.is_empty() {
            let mut map = Vec::new();
            push_u16(&mut map, 0x0180);
            push_u16(&mut map, 8);
            push_u32(&mut map, 8 + 4 * self.resource_ids.len() as u32);
            for id in &self.resource_ids {
                push_u32(&mut map, *id);
            }
            body.extend_from_slice(&map);
        }

        for chunk in &self.chunks {
            body.extend_from_slice(chunk);
        }

        let mut doc = Vec::new();
        push_u16(&mut doc, 0x0003);
        push_u16(&mut doc, 8);
        push_u32(&mut doc, 8 + body.len() as u32);
        doc.extend_from_slice(&body);
        doc
    }
}

/// One present entry of a type chunk.
pub struct EntrySpec {
    pub index: u32,
    pub key: u32,
    pub complex: bool,
    pub data_type: u8,
    pub data: u32,
}

pub struct TypeChunkSpec {
    pub type_id: u8,
    pub language: [u8; 2],
    pub country: [u8; 2],
    pub entry_count: u32,
    pub entries: Vec<EntrySpec>,
}

/// Assembles a single-package `resources.arsc` blob.
pub struct ArscBuilder {
    pub package_id: u32,
    pub global: Vec<String>,
    pub type_names: Vec<String>,
    pub keys: Vec<String>,
    pub types: Vec<TypeChunkSpec>,
}

impl ArscBuilder {
    pub fn new(package_id: u32) -> Self {
        Self {
            package_id,
            global: Vec::new(),
            type_names: Vec::new(),
            keys: Vec::new(),
            types: Vec::new(),
        }
    }

    pub fn global_string(&mut self, s: &str) -> u32 {
        self.global.push(s.to_owned());
        self.global.len() as u32 - 1
    }

    pub fn type_name(&mut self, s: &str) -> u8 {
        self.type_names.push(s.to_owned());
        self.type_names.len() as u8 // type ids are 1-based
    }

    pub fn key(&mut self, s: &str) -> u32 {
        self.keys.push(s.to_owned());
        self.keys.len() as u32 - 1
    }

    fn type_chunk(spec: &TypeChunkSpec) -> Vec<u8> {
        // header: common(8) + id/res0/res1(4) + entry_count(4)
        //         + entries_start(4) + config(16)
        let header_size: u16 = 36;
        let offsets_len = 4 * spec.entry_count;
        let entries_start = u32::from(header_size) + offsets_len;

        let mut offsets = vec![0xffff_ffffu32; spec.entry_count as usize];
        let mut entry_data = Vec::new();
        for entry in &spec.entries {
            offsets[entry.index as usize] = entry_data.len() as u32;
            if entry.complex {
                push_u16(&mut entry_data, 16); // entry size
                push_u16(&mut entry_data, 0x0001); // FLAG_COMPLEX
                push_u32(&mut entry_data, entry.key);
                push_u32(&mut entry_data, 0); // parent
                push_u32(&mut entry_data, 0); // map count
            } else {
                push_u16(&mut entry_data, 8);
                push_u16(&mut entry_data, 0);
                push_u32(&mut entry_data, entry.key);
                push_u16(&mut entry_data, 8); // value size
                entry_data.push(0); // res0
                entry_data.push(entry.data_type);
                push_u32(&mut entry_data, entry.data);
            }
        }

        let mut chunk = Vec::new();
        push_u16(&mut chunk, 0x0201);
        push_u16(&mut chunk, header_size);
        push_u32(&mut chunk, entries_start + entry_data.len() as u32);
        chunk.push(spec.type_id);
        chunk.push(0); // res0
        push_u16(&mut chunk, 0); // res1
        push_u32(&mut chunk, spec.entry_count);
        push_u32(&mut chunk, entries_start);
        // config block, declared size 16
        push_u32(&mut chunk, 16);
        push_u16(&mut chunk, 0); // mcc
        push_u16(&mut chunk, 0); // mnc
        chunk.extend_from_slice(&spec.language);
        chunk.extend_from_slice(&spec.country);
        chunk.push(0); // orientation
        chunk.push(0); // touchscreen
        push_u16(&mut chunk, 0); // density
        for o in &offsets {
            push_u32(&mut chunk, *o);
        }
        chunk.extend_from_slice(&entry_data);
        chunk
    }

    pub fn build(self) -> Vec<u8> {
        let global_pool = string_pool_chunk(&self.global);
        let type_pool = string_pool_chunk(&self.type_names);
        let key_pool = string_pool_chunk(&self.keys);

        let package_header_size: u32 = 8 + 4 + 256 + 16;
        let type_strings = package_header_size;
        let key_strings = type_strings + type_pool.len() as u32;

        let mut type_chunks = Vec::new();
        for spec in &self.types {
            type_chunks.extend_from_slice(&Self::type_chunk(spec));
        }

        let package_size =
            package_header_size + type_pool.len() as u32 + key_pool.len() as u32 + type_chunks.len() as u32;

        let mut package = Vec::new();
        push_u16(&mut package, 0x0200);
        push_u16(&mut package, package_header_size as u16);
        push_u32(&mut package, package_size);
        push_u32(&mut package, self.package_id);
        let mut name = [0u8; 256];
        for (i, b) in "com.example.res".encode_utf16().enumerate() {
            name[i * 2..i * 2 + 2].copy_from_slice(&b.to_le_bytes());
        }
        package.extend_from_slice(&name);
        push_u32(&mut package, type_strings);
        push_u32(&mut package, 0); // last_public_type
        push_u32(&mut package, key_strings);
        push_u32(&mut package, 0); // last_public_key
        package.extend_from_slice(&type_pool);
        package.extend_from_slice(&key_pool);
        package.extend_from_slice(&type_chunks);

        let mut table = Vec::new();
        push_u16(&mut table, 0x0002);
        push_u16(&mut table, 12);
        push_u32(&mut table, 12 + global_pool.len() as u32 + package.len() as u32);
        push_u32(&mut table, 1); // package_count
        table.extend_from_slice(&global_pool);
        table.extend_from_slice(&package);
        table
    }
}
