// SPDX-FileCopyrightText: Copyright (c) 2018-2025 slowtec GmbH <post@slowtec.de>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modbus TCP client (master) specific functions.
use super::*;

/// Encode an TCP request.
pub fn encode_request(hdr: Header, pdu: &Pdu) -> Result<Vec<u8>> {
    let len = HEADER_LEN + pdu.len();
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameSize(len, MAX_FRAME_LEN));
    }
    let mut buf = vec![0; len];
    BigEndian::write_u16(&mut buf[..2], hdr.transaction_id);
    BigEndian::write_u16(&mut buf[2..4], PROTOCOL_ID);
    // Length = sizeof(unit id) + sizeof(function code) + data
    BigEndian::write_u16(&mut buf[4..6], (1 + pdu.len()) as u16);
    buf[6] = hdr.unit_id;
    buf[7] = pdu.fn_code();
    buf[8..].copy_from_slice(pdu.data());
    Ok(buf)
}

/// Check transaction id, protocol id and unit id of a response.
pub fn verify_response(request: &[u8], response: &[u8]) -> Result<()> {
    if request.len() < HEADER_LEN {
        return Err(Error::FrameTooShort(request.len(), HEADER_LEN));
    }
    if response.len() < HEADER_LEN {
        return Err(Error::FrameTooShort(response.len(), HEADER_LEN));
    }
    let expected = BigEndian::read_u16(&request[0..2]);
    let actual = BigEndian::read_u16(&response[0..2]);
    if actual != expected {
        return Err(Error::TransactionId(expected, actual));
    }
    let expected = BigEndian::read_u16(&request[2..4]);
    let actual = BigEndian::read_u16(&response[2..4]);
    if actual != expected {
        return Err(Error::ProtocolId(expected, actual));
    }
    if response[6] != request[6] {
        return Err(Error::UnitId(request[6], response[6]));
    }
    Ok(())
}

/// Decode an TCP response.
///
/// The header fields have to be checked with [`verify_response`] before.
pub fn decode_response(adu: &[u8]) -> Result<Pdu> {
    if adu.len() <= HEADER_LEN {
        return Err(Error::FrameTooShort(adu.len(), HEADER_LEN + 1));
    }
    let (hdr_buf, pdu_data) = adu.split_at(HEADER_LEN);
    let m_length = BigEndian::read_u16(&hdr_buf[4..6]) as usize;
    let pdu_len = pdu_data.len();
    if m_length != pdu_len + 1 {
        return Err(Error::LengthMismatch(m_length, pdu_len + 1));
    }
    Ok(Pdu::from_raw(pdu_data[0], &pdu_data[1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_write_single_register_request() {
        let pdu = Pdu::new(
            FunctionCode::WriteSingleRegister,
            vec![0x22, 0x22, 0xAB, 0xCD],
        );
        let req = encode_request(
            Header {
                transaction_id: 0x1234,
                unit_id: 0x12,
            },
            &pdu,
        )
        .expect("Error encoding request");

        assert_eq!(
            req,
            &[
                0x12, // transaction id
                0x34, // transaction id
                0x00, // protocol id
                0x00, // protocol id
                0x00, // length high byte
                0x06, // length low byte
                0x12, // unit id
                0x06, // function code
                0x22, // addr
                0x22, // addr
                0xAB, // value
                0xCD, // value
            ]
        );
    }

    #[test]
    fn encode_too_large_request() {
        let hdr = Header {
            transaction_id: 1,
            unit_id: 1,
        };
        let pdu = Pdu::from_raw(0x10, vec![0; 252]);
        assert_eq!(encode_request(hdr, &pdu).unwrap().len(), MAX_FRAME_LEN);

        let pdu = Pdu::from_raw(0x10, vec![0; 253]);
        assert!(matches!(
            encode_request(hdr, &pdu),
            Err(Error::FrameSize(261, MAX_FRAME_LEN))
        ));
    }

    #[test]
    fn decode_write_single_register_response() {
        let rsp = &[
            0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x12, 0x06, 0x22, 0x22, 0xAB, 0xCD,
        ];
        let pdu = decode_response(rsp).unwrap();
        assert_eq!(pdu.function(), FunctionCode::WriteSingleRegister);
        assert_eq!(pdu.data(), &[0x22, 0x22, 0xAB, 0xCD]);
    }

    #[test]
    fn decode_length_mismatch() {
        // length field says 7, but only 5 bytes follow the unit id
        let rsp = &[
            0x12, 0x34, 0x00, 0x00, 0x00, 0x07, 0x12, 0x06, 0x22, 0x22, 0xAB, 0xCD,
        ];
        assert!(matches!(
            decode_response(rsp),
            Err(Error::LengthMismatch(7, 6))
        ));

        let rsp = &[0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x12, 0x06];
        assert!(matches!(
            decode_response(rsp),
            Err(Error::LengthMismatch(1, 2))
        ));
    }

    #[test]
    fn decode_header_only() {
        let rsp = &[0x12, 0x34, 0x00, 0x00, 0x00, 0x01, 0x12];
        assert!(matches!(
            decode_response(rsp),
            Err(Error::FrameTooShort(7, 8))
        ));
    }

    #[test]
    fn round_trip() {
        for len in [0, 1, 2, 17, 251, 252] {
            let data: Vec<u8> = (0..len).map(|i| (i * 13) as u8).collect();
            let pdu = Pdu::from_raw(0x42, data);
            let hdr = Header {
                transaction_id: len as u16,
                unit_id: 0xFF,
            };
            let adu = encode_request(hdr, &pdu).unwrap();
            assert_eq!(adu.len(), HEADER_LEN + 1 + len);
            assert_eq!(decode_response(&adu).unwrap(), pdu);
        }
    }

    mod verify {
        use super::*;

        const REQUEST: &[u8] = &[0x12, 0x34, 0x00, 0x00, 0x00, 0x06, 0x11, 0x03, 0x00, 0x00, 0x00, 0x01];

        fn response(transaction_id: u16, protocol_id: u16, unit_id: u8) -> Vec<u8> {
            let mut rsp = vec![0; 11];
            BigEndian::write_u16(&mut rsp[0..2], transaction_id);
            BigEndian::write_u16(&mut rsp[2..4], protocol_id);
            BigEndian::write_u16(&mut rsp[4..6], 5);
            rsp[6] = unit_id;
            rsp[7..].copy_from_slice(&[0x03, 0x02, 0x00, 0x2A]);
            rsp
        }

        #[test]
        fn matching_response() {
            assert!(verify_response(REQUEST, &response(0x1234, 0, 0x11)).is_ok());
        }

        #[test]
        fn transaction_id_mismatch() {
            assert!(matches!(
                verify_response(REQUEST, &response(0x1235, 0, 0x11)),
                Err(Error::TransactionId(0x1234, 0x1235))
            ));
        }

        #[test]
        fn protocol_id_mismatch() {
            assert!(matches!(
                verify_response(REQUEST, &response(0x1234, 1, 0x11)),
                Err(Error::ProtocolId(0, 1))
            ));
        }

        #[test]
        fn unit_id_mismatch() {
            assert!(matches!(
                verify_response(REQUEST, &response(0x1234, 0, 0x12)),
                Err(Error::UnitId(0x11, 0x12))
            ));
        }

        #[test]
        fn short_response() {
            assert!(matches!(
                verify_response(REQUEST, &[0x12, 0x34, 0x00]),
                Err(Error::FrameTooShort(3, HEADER_LEN))
            ));
        }
    }
}
