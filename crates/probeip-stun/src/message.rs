//! STUN message codec (RFC 5389)
//!
//! Only the pieces a binding client needs are interpreted: the 20-byte header,
//! the message type (method and class) and the XOR-MAPPED-ADDRESS attribute.
//! Every other attribute is carried as opaque bytes.

use crate::error::StunError;
use rand::RngCore;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// STUN magic cookie (0x2112A442)
pub const MAGIC_COOKIE: u32 = 0x2112_A442;

/// STUN message header size (20 bytes)
pub const HEADER_SIZE: usize = 20;

/// XOR-MAPPED-ADDRESS attribute type
const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;

const FAMILY_IPV4: u8 = 0x01;
const FAMILY_IPV6: u8 = 0x02;

/// 96-bit STUN transaction identifier
pub type TransactionId = [u8; 12];

/// STUN message class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunMessageClass {
    /// Request message
    Request,
    /// Indication (no response expected)
    Indication,
    /// Success response
    SuccessResponse,
    /// Error response
    ErrorResponse,
}

impl StunMessageClass {
    fn bits(self) -> u16 {
        match self {
            Self::Request => 0b00,
            Self::Indication => 0b01,
            Self::SuccessResponse => 0b10,
            Self::ErrorResponse => 0b11,
        }
    }

    fn from_bits(bits: u16) -> Self {
        match bits & 0b11 {
            0b00 => Self::Request,
            0b01 => Self::Indication,
            0b10 => Self::SuccessResponse,
            _ => Self::ErrorResponse,
        }
    }
}

/// STUN method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunMethod {
    /// Binding (0x001)
    Binding,
    /// Any other 12-bit method, kept so callers can ignore it
    Other(u16),
}

impl StunMethod {
    fn code(self) -> u16 {
        match self {
            Self::Binding => 0x0001,
            Self::Other(code) => code & 0x0FFF,
        }
    }

    fn from_code(code: u16) -> Self {
        match code {
            0x0001 => Self::Binding,
            other => Self::Other(other),
        }
    }
}

/// Encode method and class into the 16-bit message type
///
/// RFC 5389 Section 6 encoding:
/// ```text
///  0                 1
///  2  3  4 5 6 7 8 9 0 1 2 3 4 5
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// |M |M |M|M|M|C|M|M|M|C|M|M|M|M|
/// |11|10|9|8|7|1|6|5|4|0|3|2|1|0|
/// +--+--+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
fn encode_type(method: StunMethod, class: StunMessageClass) -> u16 {
    let method = method.code();
    let class_bits = class.bits();

    // Bits 0-3: M0-M3
    let m0_m3 = method & 0x0F;
    // Bit 4: C0
    let c0 = (class_bits & 0x01) << 4;
    // Bits 5-7: M4-M6
    let m4_m6 = (method & 0x70) << 1;
    // Bit 8: C1
    let c1 = (class_bits & 0x02) << 7;
    // Bits 9-13: M7-M11
    let m7_m11 = (method & 0xF80) << 2;

    m0_m3 | c0 | m4_m6 | c1 | m7_m11
}

fn decode_type(msg_type: u16) -> Result<(StunMethod, StunMessageClass), StunError> {
    // The two most significant bits are always zero
    if msg_type & 0xC000 != 0 {
        return Err(StunError::InvalidMessageType);
    }

    let c0 = (msg_type >> 4) & 0x01;
    let c1 = (msg_type >> 8) & 0x01;
    let class = StunMessageClass::from_bits(c0 | (c1 << 1));

    let m0_m3 = msg_type & 0x0F;
    let m4_m6 = (msg_type >> 1) & 0x70;
    let m7_m11 = (msg_type >> 2) & 0xF80;
    let method = StunMethod::from_code(m0_m3 | m4_m6 | m7_m11);

    Ok((method, class))
}

/// STUN attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StunAttribute {
    /// XOR-Mapped address (0x0020)
    XorMappedAddress(SocketAddr),
    /// Attribute this client does not interpret
    Unknown(u16, Vec<u8>),
}

impl StunAttribute {
    /// Attribute type code
    #[must_use]
    pub fn attr_type(&self) -> u16 {
        match self {
            Self::XorMappedAddress(_) => ATTR_XOR_MAPPED_ADDRESS,
            Self::Unknown(t, _) => *t,
        }
    }

    /// Append the type-length-value encoding, padded to 4 bytes, to `out`
    fn encode_into(&self, transaction_id: &TransactionId, out: &mut Vec<u8>) {
        let value = match self {
            Self::XorMappedAddress(addr) => encode_xor_address(addr, transaction_id),
            Self::Unknown(_, data) => data.clone(),
        };

        out.extend_from_slice(&self.attr_type().to_be_bytes());
        out.extend_from_slice(&(value.len() as u16).to_be_bytes());
        out.extend_from_slice(&value);

        let padding = (4 - (value.len() % 4)) % 4;
        out.extend(std::iter::repeat_n(0, padding));
    }

    fn decode(
        attr_type: u16,
        value: &[u8],
        transaction_id: &TransactionId,
    ) -> Result<Self, StunError> {
        match attr_type {
            ATTR_XOR_MAPPED_ADDRESS => {
                decode_xor_address(value, transaction_id).map(Self::XorMappedAddress)
            }
            _ => Ok(Self::Unknown(attr_type, value.to_vec())),
        }
    }
}

/// Key the address is XORed with: the magic cookie, followed by the
/// transaction ID for IPv6
fn xor_key(transaction_id: &TransactionId) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
    key[4..].copy_from_slice(transaction_id);
    key
}

fn encode_xor_address(addr: &SocketAddr, transaction_id: &TransactionId) -> Vec<u8> {
    let key = xor_key(transaction_id);
    let mut value = Vec::with_capacity(20);
    value.push(0); // Reserved

    let (family, ip_bytes): (u8, Vec<u8>) = match addr.ip() {
        IpAddr::V4(ipv4) => (FAMILY_IPV4, ipv4.octets().to_vec()),
        IpAddr::V6(ipv6) => (FAMILY_IPV6, ipv6.octets().to_vec()),
    };
    value.push(family);

    // XOR port with most significant 16 bits of magic cookie
    let xor_port = addr.port() ^ (MAGIC_COOKIE >> 16) as u16;
    value.extend_from_slice(&xor_port.to_be_bytes());
    value.extend(ip_bytes.iter().zip(key.iter()).map(|(b, k)| b ^ k));

    value
}

fn decode_xor_address(
    value: &[u8],
    transaction_id: &TransactionId,
) -> Result<SocketAddr, StunError> {
    if value.len() < 4 {
        return Err(StunError::InvalidAttribute);
    }

    let key = xor_key(transaction_id);
    let port = u16::from_be_bytes([value[2], value[3]]) ^ (MAGIC_COOKIE >> 16) as u16;

    let ip = match value[1] {
        FAMILY_IPV4 => {
            let raw = value.get(4..8).ok_or(StunError::InvalidAttribute)?;
            let mut octets = [0u8; 4];
            for (i, byte) in raw.iter().enumerate() {
                octets[i] = byte ^ key[i];
            }
            IpAddr::V4(Ipv4Addr::from(octets))
        }
        FAMILY_IPV6 => {
            let raw = value.get(4..20).ok_or(StunError::InvalidAttribute)?;
            let mut octets = [0u8; 16];
            for (i, byte) in raw.iter().enumerate() {
                octets[i] = byte ^ key[i];
            }
            IpAddr::V6(Ipv6Addr::from(octets))
        }
        _ => return Err(StunError::InvalidAttribute),
    };

    Ok(SocketAddr::new(ip, port))
}

/// STUN message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StunMessage {
    /// Message method
    pub method: StunMethod,
    /// Message class
    pub class: StunMessageClass,
    /// Transaction ID (96 bits)
    pub transaction_id: TransactionId,
    /// Message attributes
    pub attributes: Vec<StunAttribute>,
}

impl StunMessage {
    /// Create a message without attributes
    #[must_use]
    pub fn new(method: StunMethod, class: StunMessageClass, transaction_id: TransactionId) -> Self {
        Self {
            method,
            class,
            transaction_id,
            attributes: Vec::new(),
        }
    }

    /// Create a new STUN Binding Request with a fresh random transaction ID
    #[must_use]
    pub fn binding_request() -> Self {
        let mut transaction_id = [0u8; 12];
        rand::thread_rng().fill_bytes(&mut transaction_id);
        Self::new(StunMethod::Binding, StunMessageClass::Request, transaction_id)
    }

    /// Create a Binding success response carrying `mapped` as XOR-MAPPED-ADDRESS
    #[must_use]
    pub fn binding_success(transaction_id: TransactionId, mapped: SocketAddr) -> Self {
        let mut msg = Self::new(
            StunMethod::Binding,
            StunMessageClass::SuccessResponse,
            transaction_id,
        );
        msg.add_attribute(StunAttribute::XorMappedAddress(mapped));
        msg
    }

    /// Add an attribute to the message
    pub fn add_attribute(&mut self, attr: StunAttribute) {
        self.attributes.push(attr);
    }

    /// Whether this is a Binding success or Binding error response
    #[must_use]
    pub fn is_binding_response(&self) -> bool {
        self.method == StunMethod::Binding
            && matches!(
                self.class,
                StunMessageClass::SuccessResponse | StunMessageClass::ErrorResponse
            )
    }

    /// Encode message to bytes
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);

        bytes.extend_from_slice(&encode_type(self.method, self.class).to_be_bytes());

        // Message Length - placeholder
        bytes.extend_from_slice(&[0u8; 2]);
        bytes.extend_from_slice(&MAGIC_COOKIE.to_be_bytes());
        bytes.extend_from_slice(&self.transaction_id);

        for attr in &self.attributes {
            attr.encode_into(&self.transaction_id, &mut bytes);
        }

        // Message length excludes the 20-byte header
        let msg_length = (bytes.len() - HEADER_SIZE) as u16;
        bytes[2..4].copy_from_slice(&msg_length.to_be_bytes());

        bytes
    }

    /// Decode message from bytes
    ///
    /// # Errors
    ///
    /// Returns `StunError` if the header is truncated or invalid, or if an
    /// interpreted attribute is malformed.
    pub fn decode(bytes: &[u8]) -> Result<Self, StunError> {
        if bytes.len() < HEADER_SIZE {
            return Err(StunError::MessageTooShort);
        }

        let msg_type = u16::from_be_bytes([bytes[0], bytes[1]]);
        let msg_length = u16::from_be_bytes([bytes[2], bytes[3]]) as usize;
        let magic_cookie = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);

        if magic_cookie != MAGIC_COOKIE {
            return Err(StunError::InvalidMagicCookie);
        }
        if HEADER_SIZE + msg_length > bytes.len() {
            return Err(StunError::MessageTooShort);
        }

        let mut transaction_id = [0u8; 12];
        transaction_id.copy_from_slice(&bytes[8..HEADER_SIZE]);

        let (method, class) = decode_type(msg_type)?;

        let body = &bytes[HEADER_SIZE..HEADER_SIZE + msg_length];
        let mut attributes = Vec::new();
        let mut offset = 0;

        while offset + 4 <= body.len() {
            let attr_type = u16::from_be_bytes([body[offset], body[offset + 1]]);
            let attr_length = u16::from_be_bytes([body[offset + 2], body[offset + 3]]) as usize;
            offset += 4;

            let value = body
                .get(offset..offset + attr_length)
                .ok_or(StunError::InvalidAttribute)?;
            attributes.push(StunAttribute::decode(attr_type, value, &transaction_id)?);

            // Skip padding to 4-byte boundary
            offset += attr_length + (4 - (attr_length % 4)) % 4;
        }

        Ok(Self {
            method,
            class,
            transaction_id,
            attributes,
        })
    }

    /// Get XOR-MAPPED-ADDRESS attribute
    #[must_use]
    pub fn xor_mapped_address(&self) -> Option<SocketAddr> {
        self.attributes.iter().find_map(|attr| match attr {
            StunAttribute::XorMappedAddress(addr) => Some(*addr),
            StunAttribute::Unknown(..) => None,
        })
    }
}
