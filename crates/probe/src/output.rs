//! Report line formatting for stdout

use protocol::EndpointAddress;

/// Lower-case hex bytes separated by spaces
pub fn hex_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn control_line(reply: &[u8]) -> String {
    format!("control [{} bytes]: {}", reply.len(), hex_bytes(reply))
}

pub fn interrupt_line(endpoint: EndpointAddress, data: &[u8]) -> String {
    format!(
        "interrupt {} [{} bytes]: {}",
        endpoint,
        data.len(),
        hex_bytes(data)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_bytes() {
        assert_eq!(hex_bytes(&[]), "");
        assert_eq!(hex_bytes(&[0x00, 0x0a, 0xff]), "00 0a ff");
    }

    #[test]
    fn test_lines() {
        assert_eq!(control_line(&[1, 2]), "control [2 bytes]: 01 02");
        let ep = EndpointAddress::new(0x81).unwrap();
        assert_eq!(
            interrupt_line(ep, &[0, 0, 4, 0, 0, 0, 0, 0]),
            "interrupt 0x81 [8 bytes]: 00 00 04 00 00 00 00 00"
        );
    }
}
