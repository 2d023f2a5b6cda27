//! A small XMP packet model: enough to list existing keys, register a
//! namespace, and set simple properties while leaving the rest of the
//! packet byte-for-byte intact.
//!
//! New properties are written as attributes of the first `rdf:Description`.
//! Properties being replaced are removed wherever they occur, in attribute
//! or element form.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

/// Google Camera namespace used by Micro Video motion photos.
pub const NS_GCAMERA: &str = "http://ns.google.com/photos/1.0/camera/";

const NS_X: &str = "adobe:ns:meta/";
const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

const RDF_RDF: &[u8] = b"rdf:RDF";
const RDF_DESCRIPTION: &[u8] = b"rdf:Description";

const XPACKET_BEGIN: &str = "<?xpacket begin=\"\u{feff}\" id=\"W5M0MpCehiHzreSzNTczkc9d\"?>\n";
const XPACKET_END: &str = "\n<?xpacket end=\"w\"?>";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum XmpError {
    /// The namespace URI is already bound, possibly under another prefix.
    #[error("namespace {uri} is already registered as {prefix}")]
    NamespaceAlreadyRegistered { prefix: String, uri: String },

    #[error("prefix {prefix} is bound to {existing}, cannot bind it to {uri}")]
    PrefixConflict {
        prefix: String,
        existing: String,
        uri: String,
    },

    #[error("namespace {0} is not registered")]
    UnknownNamespace(String),

    #[error("malformed XMP: {0}")]
    Malformed(String),

    #[error("failed to serialize XMP: {0}")]
    Serialize(String),

    #[error("XMP packet is {0} bytes, too large for a single APP1 segment")]
    PacketTooLarge(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Property {
    prefix: String,
    name: String,
    value: Option<String>,
}

/// An XMP packet read from a file (or a new, empty one).
#[derive(Debug, Clone, Default)]
pub struct XmpPacket {
    source: Option<Vec<u8>>,
    declared: Vec<(String, String)>,
    registered: Vec<(String, String)>,
    properties: Vec<Property>,
    updates: Vec<Property>,
}

fn split_qname(qname: &[u8]) -> Option<(&[u8], &[u8])> {
    let colon = qname.iter().position(|&b| b == b':')?;
    Some((&qname[..colon], &qname[colon + 1..]))
}

/// A property-holding `rdf:Description`: a direct child of `rdf:RDF`.
/// Descriptions nested inside struct values are ordinary content.
fn is_top_description(qname: &[u8], rdf_depth: Option<usize>, depth: usize) -> bool {
    qname == RDF_DESCRIPTION && rdf_depth.is_some_and(|r| depth == r + 1)
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn malformed(e: impl std::fmt::Display) -> XmpError {
    XmpError::Malformed(e.to_string())
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), XmpError> {
    writer
        .write_event(event)
        .map_err(|e| XmpError::Serialize(e.to_string()))
}

impl XmpPacket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an existing packet (the bytes after the APP1 XMP identifier).
    pub fn parse(data: &[u8]) -> Result<Self, XmpError> {
        let mut packet = Self {
            source: Some(data.to_vec()),
            ..Self::default()
        };

        let mut reader = Reader::from_reader(data);
        reader.config_mut().trim_text(false);
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut rdf_depth: Option<usize> = None;
        let mut desc_depth: Option<usize> = None;
        let mut open_prop: Option<usize> = None;
        let mut saw_rdf = false;

        loop {
            let event = reader
                .read_event_into(&mut buf)
                .map_err(|e| malformed(format!("at byte {}: {e}", reader.buffer_position())))?;
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    depth += 1;
                    packet.collect_namespaces(&e)?;
                    let name = e.name();
                    if name.as_ref() == RDF_RDF && rdf_depth.is_none() {
                        saw_rdf = true;
                        rdf_depth = Some(depth);
                    }
                    if is_top_description(name.as_ref(), rdf_depth, depth) {
                        desc_depth = Some(depth);
                        packet.collect_attribute_properties(&e)?;
                    } else if desc_depth.is_some_and(|d| depth == d + 1) {
                        open_prop = packet.push_element_property(name.as_ref());
                    }
                }
                Event::Empty(e) => {
                    packet.collect_namespaces(&e)?;
                    let name = e.name();
                    if is_top_description(name.as_ref(), rdf_depth, depth + 1) {
                        packet.collect_attribute_properties(&e)?;
                    } else if desc_depth.is_some_and(|d| depth == d) {
                        packet.push_element_property(name.as_ref());
                    }
                }
                Event::Text(t) => {
                    if let Some(idx) = open_prop {
                        if desc_depth.is_some_and(|d| depth == d + 1) {
                            let text = t.unescape().map_err(malformed)?;
                            let text = text.trim();
                            if !text.is_empty() {
                                packet.properties[idx].value = Some(text.to_string());
                            }
                        }
                    }
                }
                Event::End(_) => {
                    if desc_depth.is_some_and(|d| depth == d + 1) {
                        open_prop = None;
                    }
                    if desc_depth == Some(depth) {
                        desc_depth = None;
                    }
                    if rdf_depth == Some(depth) {
                        rdf_depth = None;
                    }
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            buf.clear();
        }

        if !saw_rdf {
            return Err(XmpError::Malformed("missing rdf:RDF".to_string()));
        }
        Ok(packet)
    }

    fn collect_namespaces(&mut self, e: &BytesStart<'_>) -> Result<(), XmpError> {
        for attr in e.attributes() {
            let attr = attr.map_err(malformed)?;
            if let Some(prefix) = attr.key.as_ref().strip_prefix(b"xmlns:") {
                let prefix = lossy(prefix);
                let uri = attr.unescape_value().map_err(malformed)?.into_owned();
                if !self.declared.iter().any(|(p, u)| *p == prefix && *u == uri) {
                    self.declared.push((prefix, uri));
                }
            }
        }
        Ok(())
    }

    fn collect_attribute_properties(&mut self, e: &BytesStart<'_>) -> Result<(), XmpError> {
        for attr in e.attributes() {
            let attr = attr.map_err(malformed)?;
            let Some((prefix, name)) = split_qname(attr.key.as_ref()) else {
                continue;
            };
            if matches!(prefix, b"xmlns" | b"rdf" | b"xml") {
                continue;
            }
            let value = attr.unescape_value().map_err(malformed)?.into_owned();
            self.properties.push(Property {
                prefix: lossy(prefix),
                name: lossy(name),
                value: Some(value),
            });
        }
        Ok(())
    }

    fn push_element_property(&mut self, qname: &[u8]) -> Option<usize> {
        let (prefix, name) = split_qname(qname)?;
        self.properties.push(Property {
            prefix: lossy(prefix),
            name: lossy(name),
            value: None,
        });
        Some(self.properties.len() - 1)
    }

    /// Existing property keys in `Xmp.<prefix>.<name>` form, in document order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for p in &self.properties {
            let key = format!("Xmp.{}.{}", p.prefix, p.name);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    fn prefix_for(&self, uri: &str) -> Option<&str> {
        self.registered
            .iter()
            .chain(self.declared.iter())
            .find(|(_, u)| u == uri)
            .map(|(p, _)| p.as_str())
    }

    fn uri_for(&self, prefix: &str) -> Option<&str> {
        self.registered
            .iter()
            .chain(self.declared.iter())
            .find(|(p, _)| p == prefix)
            .map(|(_, u)| u.as_str())
    }

    /// Bind `prefix` to `uri` for subsequent [`set_property`](Self::set_property) calls.
    ///
    /// Fails with [`XmpError::NamespaceAlreadyRegistered`] if the URI is already
    /// bound; properties will then be written under the existing prefix.
    pub fn register_namespace(&mut self, uri: &str, prefix: &str) -> Result<(), XmpError> {
        if let Some(existing) = self.prefix_for(uri) {
            return Err(XmpError::NamespaceAlreadyRegistered {
                prefix: existing.to_string(),
                uri: uri.to_string(),
            });
        }
        if let Some(bound) = self.uri_for(prefix) {
            return Err(XmpError::PrefixConflict {
                prefix: prefix.to_string(),
                existing: bound.to_string(),
                uri: uri.to_string(),
            });
        }
        self.registered.push((prefix.to_string(), uri.to_string()));
        Ok(())
    }

    /// Set a simple property, replacing any existing value.
    pub fn set_property(
        &mut self,
        uri: &str,
        name: &str,
        value: impl ToString,
    ) -> Result<(), XmpError> {
        let prefix = self
            .prefix_for(uri)
            .ok_or_else(|| XmpError::UnknownNamespace(uri.to_string()))?
            .to_string();
        let value = value.to_string();
        match self
            .updates
            .iter_mut()
            .find(|p| p.prefix == prefix && p.name == name)
        {
            Some(p) => p.value = Some(value),
            None => self.updates.push(Property {
                prefix,
                name: name.to_string(),
                value: Some(value),
            }),
        }
        Ok(())
    }

    /// Current value of a simple property, including pending updates.
    pub fn property(&self, uri: &str, name: &str) -> Option<&str> {
        let prefix = self.prefix_for(uri)?;
        self.updates
            .iter()
            .chain(self.properties.iter())
            .find(|p| p.prefix == prefix && p.name == name)
            .and_then(|p| p.value.as_deref())
    }

    fn is_updated(&self, qname: &[u8]) -> bool {
        let Some((prefix, name)) = split_qname(qname) else {
            return false;
        };
        self.updates
            .iter()
            .any(|p| p.prefix.as_bytes() == prefix && p.name.as_bytes() == name)
    }

    fn update_namespaces(&self) -> Vec<(&str, &str)> {
        let mut out: Vec<(&str, &str)> = Vec::new();
        for p in &self.updates {
            if out.iter().any(|(prefix, _)| *prefix == p.prefix) {
                continue;
            }
            if let Some(uri) = self.uri_for(&p.prefix) {
                out.push((p.prefix.as_str(), uri));
            }
        }
        out
    }

    fn push_updates(&self, desc: &mut BytesStart<'_>) {
        for p in &self.updates {
            let key = format!("{}:{}", p.prefix, p.name);
            desc.push_attribute((key.as_str(), p.value.as_deref().unwrap_or_default()));
        }
    }

    /// A new `rdf:Description` carrying every pending update.
    fn fresh_description(&self) -> BytesStart<'static> {
        let mut desc = BytesStart::new("rdf:Description");
        desc.push_attribute(("rdf:about", ""));
        for (prefix, uri) in self.update_namespaces() {
            let key = format!("xmlns:{prefix}");
            desc.push_attribute((key.as_str(), uri));
        }
        self.push_updates(&mut desc);
        desc
    }

    /// Copy of an existing description with replaced properties removed.
    /// The first description also receives the updates.
    fn rewrite_description(
        &self,
        e: &BytesStart<'_>,
        first: bool,
    ) -> Result<BytesStart<'static>, XmpError> {
        let mut out = BytesStart::new(lossy(e.name().as_ref()));
        let mut declared_here: Vec<Vec<u8>> = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(malformed)?;
            if let Some(prefix) = attr.key.as_ref().strip_prefix(b"xmlns:") {
                declared_here.push(prefix.to_vec());
            }
            if self.is_updated(attr.key.as_ref()) {
                continue;
            }
            out.push_attribute(attr);
        }
        if first {
            for (prefix, uri) in self.update_namespaces() {
                if !declared_here.iter().any(|d| d == prefix.as_bytes()) {
                    let key = format!("xmlns:{prefix}");
                    out.push_attribute((key.as_str(), uri));
                }
            }
            self.push_updates(&mut out);
        }
        Ok(out)
    }

    /// Serialize the packet with all updates applied.
    pub fn to_bytes(&self) -> Result<Vec<u8>, XmpError> {
        match &self.source {
            Some(source) => self.rewrite(source),
            None => self.build_fresh(),
        }
    }

    fn build_fresh(&self) -> Result<Vec<u8>, XmpError> {
        let mut writer = Writer::new(Vec::with_capacity(512));
        writer.get_mut().extend_from_slice(XPACKET_BEGIN.as_bytes());

        let mut xmpmeta = BytesStart::new("x:xmpmeta");
        xmpmeta.push_attribute(("xmlns:x", NS_X));
        emit(&mut writer, Event::Start(xmpmeta))?;

        let mut rdf = BytesStart::new("rdf:RDF");
        rdf.push_attribute(("xmlns:rdf", NS_RDF));
        emit(&mut writer, Event::Start(rdf))?;

        emit(&mut writer, Event::Empty(self.fresh_description()))?;

        emit(&mut writer, Event::End(BytesEnd::new("rdf:RDF")))?;
        emit(&mut writer, Event::End(BytesEnd::new("x:xmpmeta")))?;
        writer.get_mut().extend_from_slice(XPACKET_END.as_bytes());
        Ok(writer.into_inner())
    }

    fn rewrite(&self, source: &[u8]) -> Result<Vec<u8>, XmpError> {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(false);
        let mut writer = Writer::new(Vec::with_capacity(source.len() + 256));
        let mut buf = Vec::new();
        let mut depth = 0usize;
        let mut rdf_depth: Option<usize> = None;
        let mut desc_depth: Option<usize> = None;
        let mut skip_depth: Option<usize> = None;
        let mut injected = false;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(malformed)?;
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    depth += 1;
                    if skip_depth.is_none() {
                        if e.name().as_ref() == RDF_RDF && rdf_depth.is_none() {
                            rdf_depth = Some(depth);
                        }
                        if is_top_description(e.name().as_ref(), rdf_depth, depth) {
                            desc_depth = Some(depth);
                            let desc = self.rewrite_description(&e, !injected)?;
                            injected = true;
                            emit(&mut writer, Event::Start(desc))?;
                        } else if desc_depth.is_some_and(|d| depth == d + 1)
                            && self.is_updated(e.name().as_ref())
                        {
                            skip_depth = Some(depth);
                        } else {
                            emit(&mut writer, Event::Start(e))?;
                        }
                    }
                }
                Event::Empty(e) => {
                    if skip_depth.is_none() {
                        if is_top_description(e.name().as_ref(), rdf_depth, depth + 1) {
                            let desc = self.rewrite_description(&e, !injected)?;
                            injected = true;
                            emit(&mut writer, Event::Empty(desc))?;
                        } else if desc_depth.is_some_and(|d| depth == d)
                            && self.is_updated(e.name().as_ref())
                        {
                            // replaced property in element form, dropped
                        } else {
                            emit(&mut writer, Event::Empty(e))?;
                        }
                    }
                }
                Event::End(e) => {
                    match skip_depth {
                        Some(s) => {
                            if depth == s {
                                skip_depth = None;
                            }
                        }
                        None => {
                            if rdf_depth == Some(depth) {
                                if !injected {
                                    emit(&mut writer, Event::Empty(self.fresh_description()))?;
                                    injected = true;
                                }
                                rdf_depth = None;
                            }
                            if desc_depth == Some(depth) {
                                desc_depth = None;
                            }
                            emit(&mut writer, Event::End(e))?;
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                other => {
                    if skip_depth.is_none() {
                        emit(&mut writer, other)?;
                    }
                }
            }
            buf.clear();
        }

        if !injected {
            return Err(XmpError::Malformed(
                "no rdf:RDF element to hold properties".to_string(),
            ));
        }
        Ok(writer.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXISTING: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<rdf:Description rdf:about=""
  xmlns:dc="http://purl.org/dc/elements/1.1/"
  xmlns:xmp="http://ns.adobe.com/xap/1.0/"
  xmp:CreatorTool="Camera 2.0">
  <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Beach &amp; sun</rdf:li></rdf:Alt></dc:title>
</rdf:Description>
</rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    const CONVERTED: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
<rdf:Description rdf:about="" xmlns:GCamera="http://ns.google.com/photos/1.0/camera/"
  GCamera:MicroVideo="1" GCamera:MicroVideoVersion="1">
  <GCamera:MicroVideoOffset>99</GCamera:MicroVideoOffset>
</rdf:Description>
</rdf:RDF>
</x:xmpmeta>"#;

    fn set_motion_tags(packet: &mut XmpPacket, offset: u64) {
        packet.set_property(NS_GCAMERA, "MicroVideo", 1).unwrap();
        packet.set_property(NS_GCAMERA, "MicroVideoVersion", 1).unwrap();
        packet.set_property(NS_GCAMERA, "MicroVideoOffset", offset).unwrap();
        packet
            .set_property(NS_GCAMERA, "MicroVideoPresentationTimestampUs", 1_500_000)
            .unwrap();
    }

    #[test]
    fn fresh_packet_round_trips() {
        let mut packet = XmpPacket::new();
        assert!(packet.keys().is_empty());
        packet.register_namespace(NS_GCAMERA, "GCamera").unwrap();
        set_motion_tags(&mut packet, 4096);

        let bytes = packet.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("<?xpacket begin="));
        assert!(text.ends_with("<?xpacket end=\"w\"?>"));

        let reread = XmpPacket::parse(&bytes).unwrap();
        assert_eq!(reread.property(NS_GCAMERA, "MicroVideo"), Some("1"));
        assert_eq!(reread.property(NS_GCAMERA, "MicroVideoOffset"), Some("4096"));
        assert_eq!(
            reread.property(NS_GCAMERA, "MicroVideoPresentationTimestampUs"),
            Some("1500000")
        );
        assert_eq!(reread.keys().len(), 4);
    }

    #[test]
    fn lists_existing_keys() {
        let packet = XmpPacket::parse(EXISTING.as_bytes()).unwrap();
        let keys = packet.keys();
        assert!(keys.contains(&"Xmp.xmp.CreatorTool".to_string()));
        assert!(keys.contains(&"Xmp.dc.title".to_string()));
        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn existing_content_survives_update() {
        let mut packet = XmpPacket::parse(EXISTING.as_bytes()).unwrap();
        packet.register_namespace(NS_GCAMERA, "GCamera").unwrap();
        set_motion_tags(&mut packet, 10);

        let bytes = packet.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("Beach &amp; sun"));
        assert!(text.contains("<?xpacket end=\"w\"?>"));
        assert!(text.contains(r#"xmlns:GCamera="http://ns.google.com/photos/1.0/camera/""#));

        let reread = XmpPacket::parse(&bytes).unwrap();
        assert_eq!(reread.property("http://ns.adobe.com/xap/1.0/", "CreatorTool"), Some("Camera 2.0"));
        assert_eq!(reread.property(NS_GCAMERA, "MicroVideoOffset"), Some("10"));
    }

    #[test]
    fn already_registered_namespace_is_distinguishable() {
        let mut packet = XmpPacket::parse(CONVERTED.as_bytes()).unwrap();
        let err = packet.register_namespace(NS_GCAMERA, "GCamera").unwrap_err();
        assert_eq!(
            err,
            XmpError::NamespaceAlreadyRegistered {
                prefix: "GCamera".to_string(),
                uri: NS_GCAMERA.to_string(),
            }
        );
    }

    #[test]
    fn overlapping_keys_are_replaced_not_duplicated() {
        let mut packet = XmpPacket::parse(CONVERTED.as_bytes()).unwrap();
        assert_eq!(packet.property(NS_GCAMERA, "MicroVideoOffset"), Some("99"));
        let _ = packet.register_namespace(NS_GCAMERA, "GCamera");
        set_motion_tags(&mut packet, 2048);

        let bytes = packet.to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.matches("GCamera:MicroVideo=").count(), 1);
        assert_eq!(text.matches("xmlns:GCamera=").count(), 1);
        assert!(!text.contains(">99<"));

        let reread = XmpPacket::parse(&bytes).unwrap();
        assert_eq!(reread.property(NS_GCAMERA, "MicroVideoOffset"), Some("2048"));
    }

    #[test]
    fn namespace_under_other_prefix_is_reused() {
        let xmp = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:GCam="http://ns.google.com/photos/1.0/camera/" GCam:MicroVideo="0"/></rdf:RDF></x:xmpmeta>"#;
        let mut packet = XmpPacket::parse(xmp.as_bytes()).unwrap();
        let err = packet.register_namespace(NS_GCAMERA, "GCamera").unwrap_err();
        assert!(matches!(err, XmpError::NamespaceAlreadyRegistered { ref prefix, .. } if prefix == "GCam"));

        set_motion_tags(&mut packet, 7);
        let text = String::from_utf8(packet.to_bytes().unwrap()).unwrap();
        assert!(text.contains(r#"GCam:MicroVideo="1""#));
        assert!(!text.contains(r#"GCam:MicroVideo="0""#));
    }

    #[test]
    fn struct_values_do_not_hide_later_properties() {
        let xmp = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:s="http://example.com/s/" xmlns:GCamera="http://ns.google.com/photos/1.0/camera/"><s:Struct><rdf:Description s:a="1"/></s:Struct><s:Other><rdf:Description><s:b>2</s:b></rdf:Description></s:Other><GCamera:MicroVideoOffset>99</GCamera:MicroVideoOffset></rdf:Description></rdf:RDF></x:xmpmeta>"#;
        let mut packet = XmpPacket::parse(xmp.as_bytes()).unwrap();
        assert_eq!(
            packet.keys(),
            vec!["Xmp.s.Struct", "Xmp.s.Other", "Xmp.GCamera.MicroVideoOffset"]
        );
        assert_eq!(packet.property(NS_GCAMERA, "MicroVideoOffset"), Some("99"));

        let _ = packet.register_namespace(NS_GCAMERA, "GCamera");
        set_motion_tags(&mut packet, 2048);
        let text = String::from_utf8(packet.to_bytes().unwrap()).unwrap();

        assert_eq!(text.matches("MicroVideoOffset").count(), 1);
        assert!(text.contains(r#"GCamera:MicroVideoOffset="2048""#));
        assert!(text.contains(r#"<s:Struct><rdf:Description s:a="1"/></s:Struct>"#));
        assert!(text.contains("<s:b>2</s:b>"));
    }

    #[test]
    fn prefix_bound_elsewhere_conflicts() {
        let xmp = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="" xmlns:GCamera="http://example.com/other/"/></rdf:RDF></x:xmpmeta>"#;
        let mut packet = XmpPacket::parse(xmp.as_bytes()).unwrap();
        assert!(matches!(
            packet.register_namespace(NS_GCAMERA, "GCamera"),
            Err(XmpError::PrefixConflict { .. })
        ));
    }

    #[test]
    fn rdf_without_description_gets_one() {
        let xmp = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/"><rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"></rdf:RDF></x:xmpmeta>"#;
        let mut packet = XmpPacket::parse(xmp.as_bytes()).unwrap();
        packet.register_namespace(NS_GCAMERA, "GCamera").unwrap();
        set_motion_tags(&mut packet, 3);

        let reread = XmpPacket::parse(&packet.to_bytes().unwrap()).unwrap();
        assert_eq!(reread.property(NS_GCAMERA, "MicroVideoOffset"), Some("3"));
    }

    #[test]
    fn unknown_namespace_rejected() {
        let mut packet = XmpPacket::new();
        assert!(matches!(
            packet.set_property(NS_GCAMERA, "MicroVideo", 1),
            Err(XmpError::UnknownNamespace(_))
        ));
    }

    #[test]
    fn malformed_packets_rejected() {
        assert!(matches!(
            XmpPacket::parse(b"<x:xmpmeta><rdf:RDF></x:xmpmeta>"),
            Err(XmpError::Malformed(_))
        ));
        assert!(matches!(
            XmpPacket::parse(b"<x:xmpmeta/>"),
            Err(XmpError::Malformed(_))
        ));
    }
}
