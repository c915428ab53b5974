//! Descriptor and generic signature walking
//!
//! Plain descriptors are a subset of the signature grammar, so one recursive
//! descent parser serves both. Every class type found is handed to the sink in
//! its internal (`/`-separated) form; inner class types written as
//! `Lpkg/Outer<TT;>.Inner;` are reported as both `pkg/Outer` and
//! `pkg/Outer$Inner`.

use crate::error::ClassFileError;

/// Walk a field descriptor (`Ljava/lang/String;`, `[I`) or field signature
pub fn visit_field_type<F: FnMut(&str)>(desc: &str, sink: F) -> Result<(), ClassFileError> {
    let mut parser = SignatureParser::new(desc, sink);
    parser.java_type()?;
    parser.finish()
}

/// Walk a method descriptor or generic method signature
pub fn visit_method_type<F: FnMut(&str)>(desc: &str, sink: F) -> Result<(), ClassFileError> {
    let mut parser = SignatureParser::new(desc, sink);
    parser.method_signature()?;
    parser.finish()
}

/// Walk a generic class signature (type parameters, superclass, interfaces)
pub fn visit_class_signature<F: FnMut(&str)>(sig: &str, sink: F) -> Result<(), ClassFileError> {
    let mut parser = SignatureParser::new(sig, sink);
    parser.class_signature()?;
    parser.finish()
}

struct SignatureParser<'s, F> {
    src: &'s str,
    pos: usize,
    sink: F,
}

impl<'s, F: FnMut(&str)> SignatureParser<'s, F> {
    fn new(src: &'s str, sink: F) -> Self {
        Self { src, pos: 0, sink }
    }

    fn error(&self) -> ClassFileError {
        ClassFileError::MalformedSignature(self.src.to_string())
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn bump(&mut self) -> Result<u8, ClassFileError> {
        let c = self.peek().ok_or_else(|| self.error())?;
        self.pos += 1;
        Ok(c)
    }

    fn expect(&mut self, wanted: u8) -> Result<(), ClassFileError> {
        if self.bump()? == wanted {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn finish(&self) -> Result<(), ClassFileError> {
        if self.pos == self.src.len() {
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// Read up to (not including) the first byte in `stops`
    fn identifier(&mut self, stops: &[u8]) -> Result<&'s str, ClassFileError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if stops.contains(&c) {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start || self.peek().is_none() {
            return Err(self.error());
        }
        Ok(&self.src[start..self.pos])
    }

    fn class_signature(&mut self) -> Result<(), ClassFileError> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        // superclass followed by any number of interfaces
        while self.peek().is_some() {
            self.class_type()?;
        }
        Ok(())
    }

    fn method_signature(&mut self) -> Result<(), ClassFileError> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }
        self.expect(b'(')?;
        while self.peek() != Some(b')') {
            self.java_type()?;
        }
        self.expect(b')')?;
        if self.peek() == Some(b'V') {
            self.pos += 1;
        } else {
            self.java_type()?;
        }
        while self.peek() == Some(b'^') {
            self.pos += 1;
            self.reference_type()?;
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<(), ClassFileError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            self.identifier(b":")?;
            self.expect(b':')?;
            // class bound may be empty, interface bounds follow with ':'
            if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.pos += 1;
                self.reference_type()?;
            }
        }
        self.expect(b'>')
    }

    fn java_type(&mut self) -> Result<(), ClassFileError> {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z') => {
                self.pos += 1;
                Ok(())
            }
            Some(_) => self.reference_type(),
            None => Err(self.error()),
        }
    }

    fn reference_type(&mut self) -> Result<(), ClassFileError> {
        match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.pos += 1;
                self.identifier(b";")?;
                self.expect(b';')
            }
            Some(b'[') => {
                self.pos += 1;
                self.java_type()
            }
            _ => Err(self.error()),
        }
    }

    fn class_type(&mut self) -> Result<(), ClassFileError> {
        self.expect(b'L')?;
        let mut name = self.identifier(b"<.;")?.to_string();
        (self.sink)(&name);
        loop {
            match self.bump()? {
                b'<' => {
                    self.pos -= 1;
                    self.type_arguments()?;
                }
                b'.' => {
                    let inner = self.identifier(b"<.;")?;
                    name.push('$');
                    name.push_str(inner);
                    (self.sink)(&name);
                }
                b';' => return Ok(()),
                _ => return Err(self.error()),
            }
        }
    }

    fn type_arguments(&mut self) -> Result<(), ClassFileError> {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            match self.peek() {
                Some(b'*') => self.pos += 1,
                Some(b'+' | b'-') => {
                    self.pos += 1;
                    self.reference_type()?;
                }
                _ => self.reference_type()?,
            }
        }
        self.expect(b'>')
    }
}
